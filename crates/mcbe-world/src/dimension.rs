//! Per-dimension chunk table and chunk-coordinate bounds.

use std::collections::HashMap;

use tracing::info;

use crate::chunk::ChunkColumn;
use crate::error::DecodeError;
use crate::key::dimension_name;
use crate::subchunk::SubChunk;

/// Inclusive chunk-coordinate bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl ChunkBounds {
    fn single(x: i32, z: i32) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_z: z,
            max_z: z,
        }
    }

    fn extend(&mut self, x: i32, z: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }
}

/// One dimension's decoded chunks.
#[derive(Debug)]
pub struct Dimension {
    id: i32,
    chunks: HashMap<(i32, i32), ChunkColumn>,
    /// Version bytes seen before the column's first sub-chunk.
    pending_versions: HashMap<(i32, i32), u8>,
    bounds: Option<ChunkBounds>,
    bounds_valid: bool,
}

impl Dimension {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            chunks: HashMap::new(),
            pending_versions: HashMap::new(),
            bounds: None,
            bounds_valid: true,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        dimension_name(self.id)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn contains_chunk(&self, x: i32, z: i32) -> bool {
        self.chunks.contains_key(&(x, z))
    }

    pub fn chunk(&self, x: i32, z: i32) -> Option<&ChunkColumn> {
        self.chunks.get(&(x, z))
    }

    pub fn chunks(&self) -> impl Iterator<Item = &ChunkColumn> {
        self.chunks.values()
    }

    /// The column at `(x, z)`, created on first use.
    fn column_mut(&mut self, x: i32, z: i32) -> &mut ChunkColumn {
        if !self.chunks.contains_key(&(x, z)) {
            let outside = self.bounds.map_or(true, |b| !b.contains(x, z));
            if outside {
                self.bounds_valid = false;
            }
        }
        let id = self.id;
        let pending = &mut self.pending_versions;
        self.chunks.entry((x, z)).or_insert_with(|| {
            let mut column = ChunkColumn::new(x, z, id);
            column.format_version = pending.remove(&(x, z));
            column
        })
    }

    /// Merge a decoded sub-chunk into the column at `(x, z)`.
    pub fn add_sub_chunk(&mut self, x: i32, z: i32, y_index: i8, sub_chunk: SubChunk) {
        self.column_mut(x, z).insert_sub_chunk(y_index, sub_chunk);
    }

    /// Record a sub-chunk that failed to decode. The column still exists.
    pub fn add_sub_chunk_error(&mut self, x: i32, z: i32, y_index: i8, error: DecodeError) {
        self.column_mut(x, z).errors.push((y_index, error));
    }

    /// Record the column's format version without creating the column.
    pub fn set_format_version(&mut self, x: i32, z: i32, version: u8) {
        match self.chunks.get_mut(&(x, z)) {
            Some(column) => column.format_version = Some(version),
            None => {
                self.pending_versions.insert((x, z), version);
            }
        }
    }

    /// Chunk bounds, recomputed if chunks were added outside the last known box.
    pub fn bounds(&mut self) -> Option<ChunkBounds> {
        if !self.bounds_valid {
            self.bounds = self.scan_bounds();
            self.bounds_valid = true;
        }
        self.bounds
    }

    fn scan_bounds(&self) -> Option<ChunkBounds> {
        let mut keys = self.chunks.keys();
        let &(x, z) = keys.next()?;
        let mut bounds = ChunkBounds::single(x, z);
        for &(x, z) in keys {
            bounds.extend(x, z);
        }
        Some(bounds)
    }

    pub fn report_bounds(&mut self) {
        let id = self.id;
        match self.bounds() {
            Some(b) => info!(
                "Bounds (chunk): dimension {} ({}) X=({} {}) Z=({} {})",
                id,
                dimension_name(id),
                b.min_x,
                b.max_x,
                b.min_z,
                b.max_z
            ),
            None => info!("Bounds (chunk): dimension {} ({}) has no chunks", id, dimension_name(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subchunk::decode_subchunk;
    use crate::testutil::uniform_subchunk;

    fn stone() -> SubChunk {
        decode_subchunk(&uniform_subchunk(0, "minecraft:stone")).unwrap()
    }

    #[test]
    fn empty_dimension_has_no_bounds() {
        let mut dim = Dimension::new(0);
        assert_eq!(dim.bounds(), None);
        assert_eq!(dim.name(), "overworld");
    }

    #[test]
    fn bounds_grow_with_chunks() {
        let mut dim = Dimension::new(1);
        dim.add_sub_chunk(0, 0, 0, stone());
        assert_eq!(dim.bounds(), Some(ChunkBounds::single(0, 0)));

        dim.add_sub_chunk(-3, 7, 0, stone());
        dim.add_sub_chunk(5, -2, 0, stone());
        assert_eq!(
            dim.bounds(),
            Some(ChunkBounds {
                min_x: -3,
                max_x: 5,
                min_z: -2,
                max_z: 7
            })
        );
        assert_eq!(dim.chunk_count(), 3);
    }

    #[test]
    fn inside_chunk_keeps_bounds_valid() {
        let mut dim = Dimension::new(0);
        dim.add_sub_chunk(-1, -1, 0, stone());
        dim.add_sub_chunk(1, 1, 0, stone());
        dim.bounds();
        dim.add_sub_chunk(0, 0, 0, stone());
        assert!(dim.bounds_valid);
        dim.add_sub_chunk(2, 0, 0, stone());
        assert!(!dim.bounds_valid);
        assert_eq!(dim.bounds().map(|b| b.max_x), Some(2));
    }

    #[test]
    fn sub_chunks_merge_into_one_column() {
        let mut dim = Dimension::new(0);
        dim.add_sub_chunk(4, 4, -1, stone());
        dim.add_sub_chunk(4, 4, 2, stone());
        let column = dim.chunk(4, 4).unwrap();
        assert_eq!(column.sub_chunks.len(), 2);
        assert_eq!(column.dimension_id, 0);
        assert_eq!(column.block_name(0, -16, 0), Some(Ok("minecraft:stone")));
    }

    #[test]
    fn version_before_first_sub_chunk() {
        let mut dim = Dimension::new(0);
        dim.set_format_version(1, 1, 40);
        assert!(!dim.contains_chunk(1, 1));
        dim.add_sub_chunk(1, 1, 0, stone());
        assert_eq!(dim.chunk(1, 1).unwrap().format_version, Some(40));

        dim.set_format_version(1, 1, 41);
        assert_eq!(dim.chunk(1, 1).unwrap().format_version, Some(41));
    }

    #[test]
    fn failed_sub_chunk_still_creates_column() {
        let mut dim = Dimension::new(2);
        dim.add_sub_chunk_error(9, 9, 3, DecodeError::UnsupportedSubchunkVersion(2));
        let column = dim.chunk(9, 9).unwrap();
        assert!(column.sub_chunks.is_empty());
        assert_eq!(column.errors.len(), 1);
    }
}
