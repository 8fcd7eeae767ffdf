//! Byte builders shared by the unit tests of this crate.

use crate::key::{chunk_key, sub_chunk_key, ChunkTag};

/// Little-endian NBT writer, just enough for palettes and small records.
#[derive(Default)]
pub struct NbtWriter {
    pub buf: Vec<u8>,
}

impl NbtWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&(s.len() as u16).to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn begin_compound(&mut self, name: &str) -> &mut Self {
        self.buf.push(10);
        self.name(name)
    }

    pub fn end(&mut self) -> &mut Self {
        self.buf.push(0);
        self
    }

    pub fn string(&mut self, name: &str, value: &str) -> &mut Self {
        self.buf.push(8);
        self.name(name).name(value)
    }

    pub fn int(&mut self, name: &str, value: i32) -> &mut Self {
        self.buf.push(3);
        self.name(name);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn long(&mut self, name: &str, value: i64) -> &mut Self {
        self.buf.push(4);
        self.name(name);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn byte(&mut self, name: &str, value: i8) -> &mut Self {
        self.buf.push(1);
        self.name(name);
        self.buf.push(value as u8);
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// One palette compound: `{name, states: {}, version}`.
pub fn palette_entry(name: &str) -> Vec<u8> {
    NbtWriter::new()
        .begin_compound("")
        .string("name", name)
        .begin_compound("states")
        .end()
        .int("version", 17_959_425)
        .end()
        .finish()
}

/// A storage layer: header byte, packed words, palette count and entries.
pub fn storage_layer(bits_per_block: u8, indices: &[u32], palette: &[&str]) -> Vec<u8> {
    let mut out = vec![bits_per_block << 1];
    if bits_per_block > 0 {
        let bpb = bits_per_block as usize;
        let per_word = 32 / bpb;
        let words = 4096usize.div_ceil(per_word);
        for w in 0..words {
            let mut word = 0u32;
            for slot in 0..per_word {
                let i = w * per_word + slot;
                if let Some(&v) = indices.get(i) {
                    word |= v << (slot * bpb);
                }
            }
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
    out.extend_from_slice(&(palette.len() as i32).to_le_bytes());
    for name in palette {
        out.extend_from_slice(&palette_entry(name));
    }
    out
}

/// A v9 sub-chunk value holding the given layers.
pub fn subchunk_v9(y_index: i8, layers: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0x09, layers.len() as u8, y_index as u8];
    for layer in layers {
        out.extend_from_slice(layer);
    }
    out
}

/// A v9 sub-chunk filled with one block.
pub fn uniform_subchunk(y_index: i8, name: &str) -> Vec<u8> {
    subchunk_v9(y_index, &[storage_layer(0, &[], &[name])])
}

/// Records for a column with one uniform sub-chunk per `(y, name)`.
pub fn column_records(
    x: i32,
    z: i32,
    dim: i32,
    subchunks: &[(i8, &str)],
) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut records = vec![(chunk_key(x, z, dim, ChunkTag::Version), vec![40])];
    for &(y, name) in subchunks {
        records.push((sub_chunk_key(x, z, dim, y), uniform_subchunk(y, name)));
    }
    records
}

/// A `level.dat` file with the given name, seed and spawn.
pub fn level_dat_bytes(name: &str, seed: i64, spawn: (i32, i32, i32)) -> Vec<u8> {
    let body = NbtWriter::new()
        .begin_compound("")
        .string("LevelName", name)
        .int("SpawnX", spawn.0)
        .int("SpawnY", spawn.1)
        .int("SpawnZ", spawn.2)
        .long("RandomSeed", seed)
        .int("StorageVersion", 10)
        .end()
        .finish();
    let mut data = 10i32.to_le_bytes().to_vec();
    data.extend_from_slice(&(body.len() as u32).to_le_bytes());
    data.extend(body);
    data
}
