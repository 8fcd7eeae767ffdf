//! Little-endian NBT variant (level.dat, chunk palettes and every other on-disk record).

use bytes::Buf;

use crate::io::NbtVariant;

pub(crate) struct LeVariant;

impl NbtVariant for LeVariant {
    fn get_u16(buf: &mut impl Buf) -> u16 {
        buf.get_u16_le()
    }

    fn get_i16(buf: &mut impl Buf) -> i16 {
        buf.get_i16_le()
    }

    fn get_i32(buf: &mut impl Buf) -> i32 {
        buf.get_i32_le()
    }

    fn get_i64(buf: &mut impl Buf) -> i64 {
        buf.get_i64_le()
    }

    fn get_f32(buf: &mut impl Buf) -> f32 {
        buf.get_f32_le()
    }

    fn get_f64(buf: &mut impl Buf) -> f64 {
        buf.get_f64_le()
    }
}
