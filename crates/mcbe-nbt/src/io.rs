//! Generic NBT reader, parameterized by byte order.
//!
//! Every read goes through [`ensure_remaining`] first, so malformed input
//! produces an error instead of a panic inside `bytes::Buf`.

use std::io::Cursor;

use bytes::Buf;
use tracing::warn;

use crate::error::NbtError;
use crate::tag::{NbtCompound, NbtRoot, NbtString, NbtTag, TagType};

/// Maximum nesting depth to prevent stack overflow.
pub const MAX_DEPTH: usize = 512;

/// Abstraction over the two byte orders. Callers check bounds before calling.
pub(crate) trait NbtVariant {
    fn get_u16(buf: &mut impl Buf) -> u16;
    fn get_i16(buf: &mut impl Buf) -> i16;
    fn get_i32(buf: &mut impl Buf) -> i32;
    fn get_i64(buf: &mut impl Buf) -> i64;
    fn get_f32(buf: &mut impl Buf) -> f32;
    fn get_f64(buf: &mut impl Buf) -> f64;
}

type Input<'a> = Cursor<&'a [u8]>;

pub(crate) fn read_nbt<V: NbtVariant>(buf: &mut Input<'_>) -> Result<NbtRoot, NbtError> {
    ensure_remaining(buf, 1)?;
    let offset = position(buf);
    let id = buf.get_u8();
    let tag_type = TagType::from_id(id).ok_or(NbtError::InvalidTag { tag: id, offset })?;
    if tag_type == TagType::End {
        return Ok(NbtRoot::new("", NbtTag::End));
    }
    let name = read_name::<V>(buf)?;
    let tag = read_tag::<V>(buf, tag_type, 0)?;
    Ok(NbtRoot { name, tag })
}

fn read_tag<V: NbtVariant>(
    buf: &mut Input<'_>,
    tag_type: TagType,
    depth: usize,
) -> Result<NbtTag, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::RecursionLimitExceeded { limit: MAX_DEPTH });
    }

    match tag_type {
        TagType::End => Ok(NbtTag::End),
        TagType::Byte => {
            ensure_remaining(buf, 1)?;
            Ok(NbtTag::Byte(buf.get_i8()))
        }
        TagType::Short => {
            ensure_remaining(buf, 2)?;
            Ok(NbtTag::Short(V::get_i16(buf)))
        }
        TagType::Int => {
            ensure_remaining(buf, 4)?;
            Ok(NbtTag::Int(V::get_i32(buf)))
        }
        TagType::Long => {
            ensure_remaining(buf, 8)?;
            Ok(NbtTag::Long(V::get_i64(buf)))
        }
        TagType::Float => {
            ensure_remaining(buf, 4)?;
            Ok(NbtTag::Float(V::get_f32(buf)))
        }
        TagType::Double => {
            ensure_remaining(buf, 8)?;
            Ok(NbtTag::Double(V::get_f64(buf)))
        }
        TagType::ByteArray => {
            let len = read_len::<V>(buf, 1)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(buf.get_i8());
            }
            Ok(NbtTag::ByteArray(arr))
        }
        TagType::String => Ok(NbtTag::String(read_string::<V>(buf)?)),
        TagType::List => {
            ensure_remaining(buf, 1)?;
            let offset = position(buf);
            let id = buf.get_u8();
            let element_type =
                TagType::from_id(id).ok_or(NbtError::InvalidTag { tag: id, offset })?;
            let len = read_len::<V>(buf, element_type.min_payload_len())?;
            if element_type == TagType::End && len > 0 {
                return Err(NbtError::InvalidTag { tag: id, offset });
            }
            let mut list = Vec::with_capacity(len);
            for _ in 0..len {
                list.push(read_tag::<V>(buf, element_type, depth + 1)?);
            }
            Ok(NbtTag::List(element_type, list))
        }
        TagType::Compound => Ok(NbtTag::Compound(read_compound::<V>(buf, depth + 1)?)),
        TagType::IntArray => {
            let len = read_len::<V>(buf, 4)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(V::get_i32(buf));
            }
            Ok(NbtTag::IntArray(arr))
        }
        TagType::LongArray => {
            let len = read_len::<V>(buf, 8)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(V::get_i64(buf));
            }
            Ok(NbtTag::LongArray(arr))
        }
    }
}

fn read_compound<V: NbtVariant>(buf: &mut Input<'_>, depth: usize) -> Result<NbtCompound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::RecursionLimitExceeded { limit: MAX_DEPTH });
    }
    let mut map = NbtCompound::new();
    loop {
        ensure_remaining(buf, 1)?;
        let offset = position(buf);
        let id = buf.get_u8();
        let tag_type = TagType::from_id(id).ok_or(NbtError::InvalidTag { tag: id, offset })?;
        if tag_type == TagType::End {
            break;
        }
        let name = read_name::<V>(buf)?;
        let tag = read_tag::<V>(buf, tag_type, depth)?;
        if map.insert(name, tag).is_some() {
            warn!(offset, "duplicate name in NBT compound, keeping the last value");
        }
    }
    Ok(map)
}

/// Read an element count and check that `len * element_size` bytes can follow.
fn read_len<V: NbtVariant>(buf: &mut Input<'_>, element_size: usize) -> Result<usize, NbtError> {
    ensure_remaining(buf, 4)?;
    let offset = position(buf);
    let len = V::get_i32(buf);
    if len < 0 {
        return Err(NbtError::NegativeLength { len, offset });
    }
    let len = len as usize;
    ensure_remaining(buf, len.saturating_mul(element_size))?;
    Ok(len)
}

fn read_string<V: NbtVariant>(buf: &mut Input<'_>) -> Result<NbtString, NbtError> {
    ensure_remaining(buf, 2)?;
    let len = V::get_u16(buf) as usize;
    ensure_remaining(buf, len)?;
    let offset = position(buf);
    let data = buf.copy_to_bytes(len).to_vec();
    let s = NbtString::from_bytes(data);
    if !s.is_utf8() {
        warn!(offset, len, "NBT string is not valid UTF-8, keeping raw bytes");
    }
    Ok(s)
}

fn read_name<V: NbtVariant>(buf: &mut Input<'_>) -> Result<String, NbtError> {
    let raw = read_string::<V>(buf)?;
    Ok(raw.to_string_lossy().into_owned())
}

fn ensure_remaining(buf: &Input<'_>, needed: usize) -> Result<(), NbtError> {
    let remaining = buf.remaining();
    if remaining < needed {
        Err(NbtError::Truncated {
            offset: position(buf),
            needed: needed - remaining,
        })
    } else {
        Ok(())
    }
}

fn position(buf: &Input<'_>) -> usize {
    buf.position() as usize
}
