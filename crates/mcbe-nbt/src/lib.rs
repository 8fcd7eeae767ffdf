//! NBT (Named Binary Tag) decoding for Minecraft Bedrock Edition world saves.
//!
//! Supports two byte orders:
//! - **Little-endian**: used by Bedrock for level.dat, chunk palettes and all
//!   other on-disk records.
//! - **Big-endian**: the Java-edition layout, for tools that mix producers.
//!
//! Decoding is pure: every call builds and returns its own tree, so it is safe
//! to decode disjoint buffers from several threads at once.

mod be;
pub mod error;
mod io;
mod le;
pub mod tag;

use std::io::Cursor;

pub use error::NbtError;
pub use io::MAX_DEPTH;
pub use tag::{NbtCompound, NbtRoot, NbtString, NbtTag, TagType};

/// Byte order of fixed-width numbers and length prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Decode one top-level value from the start of `data`.
///
/// Returns the value and the number of bytes it occupied, so callers reading
/// a stream of values can advance past it.
pub fn decode(data: &[u8], endian: Endian) -> Result<(NbtRoot, usize), NbtError> {
    let mut cursor = Cursor::new(data);
    let root = match endian {
        Endian::Little => read_nbt_le(&mut cursor)?,
        Endian::Big => read_nbt_be(&mut cursor)?,
    };
    Ok((root, cursor.position() as usize))
}

/// Decode consecutive top-level values until `data` is exhausted.
pub fn decode_all(data: &[u8], endian: Endian) -> Result<Vec<NbtRoot>, NbtError> {
    let mut roots = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let (root, consumed) = decode(&data[offset..], endian).map_err(|e| shift(e, offset))?;
        roots.push(root);
        offset += consumed;
    }
    Ok(roots)
}

/// Read little-endian NBT from a cursor, leaving it just past the value.
pub fn read_nbt_le(buf: &mut Cursor<&[u8]>) -> Result<NbtRoot, NbtError> {
    io::read_nbt::<le::LeVariant>(buf)
}

/// Read big-endian NBT from a cursor, leaving it just past the value.
pub fn read_nbt_be(buf: &mut Cursor<&[u8]>) -> Result<NbtRoot, NbtError> {
    io::read_nbt::<be::BeVariant>(buf)
}

/// Re-base error offsets that were computed against a sub-slice.
fn shift(err: NbtError, base: usize) -> NbtError {
    match err {
        NbtError::Truncated { offset, needed } => NbtError::Truncated {
            offset: offset + base,
            needed,
        },
        NbtError::InvalidTag { tag, offset } => NbtError::InvalidTag {
            tag,
            offset: offset + base,
        },
        NbtError::NegativeLength { len, offset } => NbtError::NegativeLength {
            len,
            offset: offset + base,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal NBT writer for building fixtures.
    struct Writer {
        buf: Vec<u8>,
        endian: Endian,
    }

    impl Writer {
        fn new(endian: Endian) -> Self {
            Self {
                buf: Vec::new(),
                endian,
            }
        }

        fn u8(&mut self, v: u8) -> &mut Self {
            self.buf.push(v);
            self
        }

        fn u16(&mut self, v: u16) -> &mut Self {
            match self.endian {
                Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
                Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            }
            self
        }

        fn i32(&mut self, v: i32) -> &mut Self {
            match self.endian {
                Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
                Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            }
            self
        }

        fn i64(&mut self, v: i64) -> &mut Self {
            match self.endian {
                Endian::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
                Endian::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            }
            self
        }

        fn str(&mut self, s: &str) -> &mut Self {
            self.u16(s.len() as u16);
            self.buf.extend_from_slice(s.as_bytes());
            self
        }

        /// Tag header: type byte plus name.
        fn named(&mut self, tag: u8, name: &str) -> &mut Self {
            self.u8(tag).str(name)
        }

        fn end(&mut self) -> &mut Self {
            self.u8(0)
        }

        fn finish(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.buf)
        }
    }

    fn block_state(name: &str) -> Vec<u8> {
        let mut w = Writer::new(Endian::Little);
        w.named(10, "")
            .named(8, "name")
            .str(name)
            .named(10, "states")
            .end()
            .named(3, "version")
            .i32(18_100_737)
            .end();
        w.finish()
    }

    #[test]
    fn le_empty_compound() {
        let data = Writer::new(Endian::Little).named(10, "").end().finish();
        let (root, consumed) = decode(&data, Endian::Little).unwrap();
        assert_eq!(root, NbtRoot::new("", NbtTag::Compound(NbtCompound::new())));
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn le_root_name() {
        let data = Writer::new(Endian::Little)
            .named(10, "hello world")
            .end()
            .finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        assert_eq!(root.name, "hello world");
    }

    #[test]
    fn le_scalars() {
        let mut w = Writer::new(Endian::Little);
        w.named(10, "")
            .named(1, "b")
            .u8(0xFE)
            .named(2, "s")
            .u16((-1234i16) as u16)
            .named(3, "i")
            .i32(100_000)
            .named(4, "l")
            .i64(i64::MAX)
            .named(5, "f");
        w.buf.extend_from_slice(&3.125f32.to_le_bytes());
        w.named(6, "d");
        w.buf.extend_from_slice(&std::f64::consts::PI.to_le_bytes());
        w.end();
        let data = w.finish();

        let (root, _) = decode(&data, Endian::Little).unwrap();
        let c = root.compound().unwrap();
        assert_eq!(c.get("b"), Some(&NbtTag::Byte(-2)));
        assert_eq!(c.get("s"), Some(&NbtTag::Short(-1234)));
        assert_eq!(c.get_int("i"), Some(100_000));
        assert_eq!(c.get_long("l"), Some(i64::MAX));
        assert_eq!(c.get("f"), Some(&NbtTag::Float(3.125)));
        assert_eq!(c.get("d"), Some(&NbtTag::Double(std::f64::consts::PI)));
    }

    #[test]
    fn be_scalars_and_strings() {
        let data = Writer::new(Endian::Big)
            .named(10, "Level")
            .named(3, "SpawnX")
            .i32(-120)
            .named(4, "RandomSeed")
            .i64(0x0102_0304_0506_0708)
            .named(8, "LevelName")
            .str("My World")
            .end()
            .finish();
        let (root, consumed) = decode(&data, Endian::Big).unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(root.name, "Level");
        let c = root.compound().unwrap();
        assert_eq!(c.get_int("SpawnX"), Some(-120));
        assert_eq!(c.get_long("RandomSeed"), Some(0x0102_0304_0506_0708));
        assert_eq!(c.get_str("LevelName"), Some("My World"));
    }

    #[test]
    fn byte_order_is_not_inferred() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(3, "v")
            .i32(1)
            .end()
            .finish();
        // Read as big-endian, the u16 name length 0x0000 still parses, but
        // the name "v" length 0x0100 runs off the end.
        assert!(matches!(
            decode(&data, Endian::Big),
            Err(NbtError::Truncated { .. })
        ));
    }

    #[test]
    fn le_arrays() {
        let mut w = Writer::new(Endian::Little);
        w.named(10, "").named(7, "bytes").i32(3).u8(1).u8(0xFE).u8(3);
        w.named(11, "ints").i32(2).i32(100).i32(-200);
        w.named(12, "longs").i32(2).i64(i64::MIN).i64(7);
        w.end();
        let data = w.finish();

        let (root, _) = decode(&data, Endian::Little).unwrap();
        let c = root.compound().unwrap();
        assert_eq!(c.get("bytes").unwrap().as_byte_array(), Some(&[1, -2, 3][..]));
        assert_eq!(c.get("ints").unwrap().as_int_array(), Some(&[100, -200][..]));
        assert_eq!(
            c.get("longs").unwrap().as_long_array(),
            Some(&[i64::MIN, 7][..])
        );
    }

    #[test]
    fn list_of_ints() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(9, "list")
            .u8(3)
            .i32(3)
            .i32(1)
            .i32(2)
            .i32(3)
            .end()
            .finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        assert_eq!(
            root.compound().unwrap().get("list"),
            Some(&NbtTag::List(
                TagType::Int,
                vec![NbtTag::Int(1), NbtTag::Int(2), NbtTag::Int(3)]
            ))
        );
    }

    #[test]
    fn empty_list_of_end() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(9, "list")
            .u8(0)
            .i32(0)
            .end()
            .finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        assert_eq!(
            root.compound().unwrap().get("list"),
            Some(&NbtTag::List(TagType::End, vec![]))
        );
    }

    #[test]
    fn non_empty_list_of_end_is_rejected() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(9, "list")
            .u8(0)
            .i32(4)
            .end()
            .finish();
        assert!(matches!(
            decode(&data, Endian::Little),
            Err(NbtError::InvalidTag { tag: 0, .. })
        ));
    }

    #[test]
    fn list_of_compounds() {
        let mut w = Writer::new(Endian::Little);
        w.named(10, "").named(9, "items").u8(10).i32(2);
        w.named(2, "id").u16(1).named(1, "count").u8(64).end();
        w.named(2, "id").u16(4).named(1, "count").u8(32).end();
        w.end();
        let data = w.finish();

        let (root, consumed) = decode(&data, Endian::Little).unwrap();
        assert_eq!(consumed, data.len());
        let items = root.compound().unwrap().get("items").unwrap().as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_compound().unwrap().get("count"),
            Some(&NbtTag::Byte(32))
        );
    }

    #[test]
    fn compound_preserves_source_order() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(1, "z")
            .u8(1)
            .named(1, "a")
            .u8(2)
            .named(1, "m")
            .u8(3)
            .end()
            .finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        let keys: Vec<&str> = root.compound().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn duplicate_names_stay_unique() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(1, "a")
            .u8(1)
            .named(1, "b")
            .u8(2)
            .named(1, "a")
            .u8(3)
            .end()
            .finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        let c = root.compound().unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a"), Some(&NbtTag::Byte(3)));
    }

    #[test]
    fn wide_compound_decodes() {
        let n = 80_000;
        let mut w = Writer::new(Endian::Little);
        w.named(10, "");
        for i in 0..n {
            w.named(1, &format!("e{i:05}")).u8((i % 128) as u8);
        }
        w.end();
        let data = w.finish();
        let (root, consumed) = decode(&data, Endian::Little).unwrap();
        assert_eq!(consumed, data.len());
        let compound = root.compound().unwrap();
        assert_eq!(compound.len(), n);
        assert_eq!(compound.keys().nth(79_999), Some("e79999"));
        assert_eq!(compound.get("e00130").and_then(NbtTag::as_byte), Some(2));
    }

    #[test]
    fn nested_compound() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(10, "pos")
            .named(3, "x")
            .i32(10)
            .named(3, "y")
            .i32(64)
            .end()
            .end()
            .finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        let pos = root.compound().unwrap().get_compound("pos").unwrap();
        assert_eq!(pos.get_int("y"), Some(64));
    }

    #[test]
    fn non_compound_root() {
        let data = Writer::new(Endian::Little).named(3, "n").i32(7).finish();
        let (root, consumed) = decode(&data, Endian::Little).unwrap();
        assert_eq!(root, NbtRoot::new("n", NbtTag::Int(7)));
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn invalid_utf8_string_is_not_fatal() {
        let mut w = Writer::new(Endian::Little);
        w.named(10, "").named(8, "s").u16(2).u8(0xC3).u8(0x28).end();
        let data = w.finish();
        let (root, _) = decode(&data, Endian::Little).unwrap();
        let s = root.compound().unwrap().get("s").unwrap().as_nbt_string().unwrap();
        assert_eq!(s.as_bytes(), &[0xC3, 0x28]);
        assert_eq!(s.as_str(), None);
    }

    #[test]
    fn decode_is_deterministic() {
        let data = block_state("minecraft:stone");
        let first = decode(&data, Endian::Little).unwrap();
        let second = decode(&data, Endian::Little).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn decode_all_reads_stream() {
        let mut data = block_state("minecraft:air");
        data.extend(block_state("minecraft:stone"));
        let roots = decode_all(&data, Endian::Little).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(
            roots[1].compound().unwrap().get_str("name"),
            Some("minecraft:stone")
        );
        assert!(decode_all(&[], Endian::Little).unwrap().is_empty());
    }

    #[test]
    fn decode_all_reports_absolute_offsets() {
        let mut data = block_state("minecraft:air");
        let first_len = data.len();
        data.push(0x42);
        assert_eq!(
            decode_all(&data, Endian::Little),
            Err(NbtError::InvalidTag {
                tag: 0x42,
                offset: first_len
            })
        );
    }

    // -- Error cases --

    #[test]
    fn empty_buffer_error() {
        assert!(matches!(
            decode(&[], Endian::Little),
            Err(NbtError::Truncated { offset: 0, .. })
        ));
        assert!(decode(&[], Endian::Big).is_err());
    }

    #[test]
    fn truncated_root_name() {
        // TAG_Compound, name length 10, but only 3 bytes in total.
        let data = [10, 10, 0];
        assert_eq!(
            decode(&data, Endian::Little),
            Err(NbtError::Truncated {
                offset: 3,
                needed: 10
            })
        );
    }

    #[test]
    fn unknown_tag_type() {
        let data = [10, 0, 0, 13, 0, 0];
        assert_eq!(
            decode(&data, Endian::Little),
            Err(NbtError::InvalidTag { tag: 13, offset: 3 })
        );
    }

    #[test]
    fn missing_end_tag() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(1, "a")
            .u8(1)
            .finish();
        assert!(matches!(
            decode(&data, Endian::Little),
            Err(NbtError::Truncated { .. })
        ));
    }

    #[test]
    fn oversized_array_count_is_truncated() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(11, "ints")
            .i32(i32::MAX)
            .finish();
        assert!(matches!(
            decode(&data, Endian::Little),
            Err(NbtError::Truncated { .. })
        ));
    }

    #[test]
    fn oversized_list_count_is_truncated() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(9, "list")
            .u8(10)
            .i32(1_000_000)
            .finish();
        assert!(matches!(
            decode(&data, Endian::Little),
            Err(NbtError::Truncated { .. })
        ));
    }

    #[test]
    fn negative_length() {
        let data = Writer::new(Endian::Little)
            .named(10, "")
            .named(7, "b")
            .i32(-1)
            .finish();
        assert!(matches!(
            decode(&data, Endian::Little),
            Err(NbtError::NegativeLength { len: -1, .. })
        ));
    }

    #[test]
    fn deep_nesting_fails_closed() {
        let mut w = Writer::new(Endian::Little);
        w.named(10, "");
        for _ in 0..(MAX_DEPTH + 8) {
            w.named(10, "c");
        }
        let data = w.finish();
        assert_eq!(
            decode(&data, Endian::Little),
            Err(NbtError::RecursionLimitExceeded { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn deep_list_nesting_fails_closed() {
        let mut w = Writer::new(Endian::Little);
        w.named(9, "");
        for _ in 0..(MAX_DEPTH + 8) {
            w.u8(9).i32(1);
        }
        let data = w.finish();
        assert_eq!(
            decode(&data, Endian::Little),
            Err(NbtError::RecursionLimitExceeded { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn concurrent_decodes_do_not_interfere() {
        let data = block_state("minecraft:dirt");
        let expected = decode(&data, Endian::Little).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let data = data.clone();
                std::thread::spawn(move || decode(&data, Endian::Little).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
