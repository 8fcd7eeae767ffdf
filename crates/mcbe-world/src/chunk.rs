//! Chunk column: the sub-chunks decoded for one `(x, z)` position.

use std::collections::BTreeMap;

use crate::error::DecodeError;
use crate::subchunk::SubChunk;

/// Height of one sub-chunk in blocks.
pub const SUBCHUNK_HEIGHT: i32 = 16;

/// A full chunk column, filled in one sub-chunk at a time during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkColumn {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub dimension_id: i32,
    /// Value of the chunk's `Version` (or `LegacyVersion`) record, if seen.
    pub format_version: Option<u8>,
    /// Sub-chunks keyed by their signed vertical index.
    pub sub_chunks: BTreeMap<i8, SubChunk>,
    /// Errors from sub-chunk records of this column that could not be decoded.
    pub errors: Vec<(i8, DecodeError)>,
}

impl ChunkColumn {
    pub fn new(chunk_x: i32, chunk_z: i32, dimension_id: i32) -> Self {
        Self {
            chunk_x,
            chunk_z,
            dimension_id,
            format_version: None,
            sub_chunks: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// Store the sub-chunk at vertical slot `y_index`, replacing any earlier one.
    pub fn insert_sub_chunk(&mut self, y_index: i8, sub_chunk: SubChunk) -> Option<SubChunk> {
        self.sub_chunks.insert(y_index, sub_chunk)
    }

    pub fn sub_chunk(&self, y_index: i8) -> Option<&SubChunk> {
        self.sub_chunks.get(&y_index)
    }

    /// Lowest and highest world Y covered by decoded sub-chunks.
    pub fn y_range(&self) -> Option<(i32, i32)> {
        let low = *self.sub_chunks.keys().next()?;
        let high = *self.sub_chunks.keys().next_back()?;
        Some((
            i32::from(low) * SUBCHUNK_HEIGHT,
            i32::from(high) * SUBCHUNK_HEIGHT + SUBCHUNK_HEIGHT - 1,
        ))
    }

    /// Block name at column-local `x`/`z` (0..16) and world `y`.
    ///
    /// `None` if no sub-chunk covers `y`; `Some(Err)` if the cell's palette
    /// index does not resolve.
    pub fn block_name(&self, x: usize, y: i32, z: usize) -> Option<Result<&str, DecodeError>> {
        let y_index = i8::try_from(y.div_euclid(SUBCHUNK_HEIGHT)).ok()?;
        let local_y = y.rem_euclid(SUBCHUNK_HEIGHT) as usize;
        self.sub_chunks
            .get(&y_index)
            .map(|sub| sub.block_name(x, local_y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subchunk::decode_subchunk;
    use crate::testutil::uniform_subchunk;

    fn column() -> ChunkColumn {
        let mut column = ChunkColumn::new(3, -2, 0);
        for (y, name) in [(-4i8, "minecraft:deepslate"), (0, "minecraft:stone"), (5, "minecraft:air")] {
            let sub = decode_subchunk(&uniform_subchunk(y, name)).unwrap();
            column.insert_sub_chunk(y, sub);
        }
        column
    }

    #[test]
    fn world_y_maps_to_sub_chunk() {
        let column = column();
        assert_eq!(column.block_name(0, -64, 0), Some(Ok("minecraft:deepslate")));
        assert_eq!(column.block_name(15, -49, 15), Some(Ok("minecraft:deepslate")));
        assert_eq!(column.block_name(0, 0, 0), Some(Ok("minecraft:stone")));
        assert_eq!(column.block_name(0, 95, 0), Some(Ok("minecraft:air")));
    }

    #[test]
    fn gaps_and_out_of_range_heights() {
        let column = column();
        assert_eq!(column.block_name(0, -1, 0), None);
        assert_eq!(column.block_name(0, 16, 0), None);
        assert_eq!(column.block_name(0, 100_000, 0), None);
    }

    #[test]
    fn y_range_spans_sub_chunks() {
        assert_eq!(column().y_range(), Some((-64, 95)));
        assert_eq!(ChunkColumn::new(0, 0, 0).y_range(), None);
    }

    #[test]
    fn later_sub_chunk_replaces_earlier() {
        let mut column = column();
        let sub = decode_subchunk(&uniform_subchunk(0, "minecraft:dirt")).unwrap();
        assert!(column.insert_sub_chunk(0, sub).is_some());
        assert_eq!(column.block_name(1, 1, 1), Some(Ok("minecraft:dirt")));
        assert_eq!(column.sub_chunks.len(), 3);
    }
}
