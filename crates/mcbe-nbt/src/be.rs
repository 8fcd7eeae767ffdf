//! Big-endian NBT variant, as written by Java-edition producers.

use bytes::Buf;

use crate::io::NbtVariant;

pub(crate) struct BeVariant;

impl NbtVariant for BeVariant {
    fn get_u16(buf: &mut impl Buf) -> u16 {
        buf.get_u16()
    }

    fn get_i16(buf: &mut impl Buf) -> i16 {
        buf.get_i16()
    }

    fn get_i32(buf: &mut impl Buf) -> i32 {
        buf.get_i32()
    }

    fn get_i64(buf: &mut impl Buf) -> i64 {
        buf.get_i64()
    }

    fn get_f32(buf: &mut impl Buf) -> f32 {
        buf.get_f32()
    }

    fn get_f64(buf: &mut impl Buf) -> f64 {
        buf.get_f64()
    }
}
