//! Minecraft Bedrock world-save decoding: store keys, sub-chunk block storage,
//! and per-dimension chunk aggregation.

pub mod bits;
pub mod chunk;
pub mod dimension;
pub mod error;
pub mod key;
pub mod level;
pub mod records;
pub mod storage;
pub mod subchunk;
pub mod world;

#[cfg(test)]
mod testutil;

pub use chunk::ChunkColumn;
pub use dimension::{ChunkBounds, Dimension};
pub use error::{DecodeError, WorldError};
pub use key::{classify, ChunkKeyInfo, ChunkTag, RecordKind, VillageKind};
pub use level::LevelDat;
pub use records::{decode_record, RecordPayload};
pub use storage::{count_records, LevelDbStore, MemoryStore, RecordSource};
pub use subchunk::{decode_subchunk, PaletteEntry, StorageLayer, SubChunk, SubChunkLayout};
pub use world::{CancelToken, RecordError, ScanEvent, ScanOptions, ScanReport, World};
