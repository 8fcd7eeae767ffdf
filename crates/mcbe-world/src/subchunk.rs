//! Sub-chunk block storage: packed palette indices plus an NBT palette.
//!
//! Value layout:
//! - v1: `[0x01][storage]`
//! - v8: `[0x08][layers:u8][storage]...`
//! - v9: `[0x09][layers:u8][y_index:i8][storage]...`
//!
//! Each storage is `[header:u8][words:u32_le * n][count:i32_le][palette NBT * count]`,
//! with `bits_per_block = header >> 1`.

use mcbe_nbt::{Endian, NbtCompound};
use tracing::{debug, trace};

use crate::bits::read_bits;
use crate::error::DecodeError;

/// Cells in one 16x16x16 sub-chunk.
pub const SUBCHUNK_CELLS: usize = 4096;

/// Where one storage layer's packed indices and palette live in the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubChunkLayout {
    /// Storage header byte as stored on disk.
    pub version: u8,
    pub bits_per_block: u8,
    pub blocks_per_word: u8,
    pub block_offset: u32,
    pub palette_offset: u32,
}

impl SubChunkLayout {
    /// Layout for a storage layer whose header byte is `header` and whose packed
    /// words start at `block_offset`.
    pub fn new(header: u8, block_offset: usize) -> Result<Self, DecodeError> {
        let bits_per_block = match header {
            0x00 | 0x01 | 0x02 | 0x03 | 0x04 | 0x05 | 0x06 | 0x08 | 0x0A | 0x0C | 0x10 | 0x20 => {
                header >> 1
            }
            other => return Err(DecodeError::UnsupportedPaletteWidth(other)),
        };
        let blocks_per_word = if bits_per_block == 0 {
            0
        } else {
            32 / bits_per_block
        };
        let word_count = word_count(blocks_per_word);
        Ok(Self {
            version: header,
            bits_per_block,
            blocks_per_word,
            block_offset: block_offset as u32,
            palette_offset: (block_offset + word_count * 4) as u32,
        })
    }

    pub fn word_count(&self) -> usize {
        word_count(self.blocks_per_word)
    }

    /// Bit position of cell `index` inside the packed words.
    fn bit_start(&self, index: usize) -> usize {
        let per_word = self.blocks_per_word as usize;
        (index / per_word) * 32 + (index % per_word) * self.bits_per_block as usize
    }
}

fn word_count(blocks_per_word: u8) -> usize {
    if blocks_per_word == 0 {
        0
    } else {
        SUBCHUNK_CELLS.div_ceil(blocks_per_word as usize)
    }
}

/// Index of the cell at local `(x, y, z)`, each in `0..16`.
pub fn cell_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < 16 && y < 16 && z < 16);
    ((x * 16) + z) * 16 + y
}

/// One block-state descriptor from a storage palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    /// `None` when the compound carries no `name` string.
    pub name: Option<String>,
    /// Block properties, kept as decoded.
    pub states: NbtCompound,
    pub version: Option<i32>,
}

/// One decoded storage layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageLayer {
    pub layout: SubChunkLayout,
    pub palette: Vec<PaletteEntry>,
    indices: Box<[u32]>,
    invalid_cells: usize,
}

impl StorageLayer {
    /// Raw palette indices, in `cell_index` order.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn palette_index(&self, x: usize, y: usize, z: usize) -> u32 {
        self.indices[cell_index(x, y, z)]
    }

    /// Resolve the cell at `(x, y, z)` through the palette.
    pub fn block(&self, x: usize, y: usize, z: usize) -> Result<&PaletteEntry, DecodeError> {
        resolve(&self.palette, self.palette_index(x, y, z))
    }

    /// Block name of the cell at `(x, y, z)`. Fails for cells outside the
    /// palette and for cells whose entry has no name.
    pub fn block_name(&self, x: usize, y: usize, z: usize) -> Result<&str, DecodeError> {
        resolve_name(&self.palette, self.palette_index(x, y, z))
    }

    /// Number of cells whose block name does not resolve.
    pub fn invalid_cells(&self) -> usize {
        self.invalid_cells
    }

    /// The error for the first cell whose block name does not resolve, if any.
    pub fn first_invalid(&self) -> Option<DecodeError> {
        if self.invalid_cells == 0 {
            return None;
        }
        self.indices
            .iter()
            .find_map(|&index| resolve_name(&self.palette, index).err())
    }
}

fn resolve(palette: &[PaletteEntry], index: u32) -> Result<&PaletteEntry, DecodeError> {
    palette
        .get(index as usize)
        .ok_or(DecodeError::PaletteIndexOutOfRange {
            index,
            len: palette.len(),
        })
}

fn resolve_name(palette: &[PaletteEntry], index: u32) -> Result<&str, DecodeError> {
    resolve(palette, index)?
        .name
        .as_deref()
        .ok_or(DecodeError::MissingBlockName(index as usize))
}

/// A decoded sub-chunk value.
#[derive(Debug, Clone, PartialEq)]
pub struct SubChunk {
    /// Format byte (1, 8 or 9).
    pub format: u8,
    /// Vertical index stored in v9 values.
    pub y_index: Option<i8>,
    /// Layer 0 holds blocks, layer 1 (if present) water-logging.
    pub layers: Vec<StorageLayer>,
}

impl SubChunk {
    pub fn primary(&self) -> Option<&StorageLayer> {
        self.layers.first()
    }

    /// Block name at `(x, y, z)` in the first layer. An empty sub-chunk reads as air.
    pub fn block_name(&self, x: usize, y: usize, z: usize) -> Result<&str, DecodeError> {
        match self.primary() {
            Some(layer) => layer.block_name(x, y, z),
            None => Ok("minecraft:air"),
        }
    }

    pub fn invalid_cells(&self) -> usize {
        self.layers.iter().map(StorageLayer::invalid_cells).sum()
    }

    pub fn first_invalid(&self) -> Option<DecodeError> {
        self.layers.iter().find_map(StorageLayer::first_invalid)
    }
}

/// Decode a `SubChunkPrefix` record value.
///
/// Whole-value failures (bad format byte, unknown width, truncation, bad
/// palette NBT) return `Err`. Cells whose index falls outside the palette do
/// not: they are counted on the layer and fail individually on lookup.
pub fn decode_subchunk(value: &[u8]) -> Result<SubChunk, DecodeError> {
    let format = *value.first().ok_or(DecodeError::Truncated {
        offset: 0,
        needed: 1,
    })?;

    let (layer_count, y_index, mut offset) = match format {
        0x01 => (1, None, 1),
        0x08 => (byte_at(value, 1)?, None, 2),
        0x09 => (byte_at(value, 1)?, Some(byte_at(value, 2)? as i8), 3),
        other => return Err(DecodeError::UnsupportedSubchunkVersion(other)),
    };

    let mut layers = Vec::with_capacity(layer_count as usize);
    for _ in 0..layer_count {
        let (layer, end) = decode_storage(value, offset)?;
        layers.push(layer);
        offset = end;
    }

    trace!(format, ?y_index, layers = layers.len(), "decoded sub-chunk");
    Ok(SubChunk {
        format,
        y_index,
        layers,
    })
}

/// Decode one storage layer whose header byte is at `offset`. Returns the layer
/// and the offset just past its palette.
fn decode_storage(value: &[u8], offset: usize) -> Result<(StorageLayer, usize), DecodeError> {
    let header = byte_at(value, offset)?;
    let layout = SubChunkLayout::new(header, offset + 1)?;
    let block_offset = layout.block_offset as usize;
    let palette_offset = layout.palette_offset as usize;
    ensure_len(value, palette_offset + 4)?;

    let indices = if layout.bits_per_block == 0 {
        vec![0u32; SUBCHUNK_CELLS].into_boxed_slice()
    } else {
        let words = &value[block_offset..palette_offset];
        (0..SUBCHUNK_CELLS)
            .map(|i| {
                read_bits(words, layout.bit_start(i), u32::from(layout.bits_per_block))
                    .map_err(|e| e.at(block_offset))
            })
            .collect::<Result<Box<[u32]>, _>>()?
    };

    let (palette, end) = decode_palette(value, palette_offset)?;
    let invalid_cells = indices
        .iter()
        .filter(|&&i| resolve_name(&palette, i).is_err())
        .count();

    Ok((
        StorageLayer {
            layout,
            palette,
            indices,
            invalid_cells,
        },
        end,
    ))
}

fn decode_palette(value: &[u8], offset: usize) -> Result<(Vec<PaletteEntry>, usize), DecodeError> {
    let count = i32::from_le_bytes([
        value[offset],
        value[offset + 1],
        value[offset + 2],
        value[offset + 3],
    ]);
    if count < 0 {
        return Err(DecodeError::NegativeLength { len: count, offset });
    }

    let mut pos = offset + 4;
    // Every entry takes at least one byte.
    let mut palette = Vec::with_capacity((count as usize).min(value.len() - pos));
    for i in 0..count as usize {
        let (root, consumed) =
            mcbe_nbt::decode(&value[pos..], Endian::Little).map_err(|e| DecodeError::from(e).at(pos))?;
        pos += consumed;

        let entry = match root.compound() {
            Some(compound) => PaletteEntry {
                name: compound
                    .get("name")
                    .and_then(|tag| tag.as_nbt_string())
                    .map(|name| name.to_string_lossy().into_owned()),
                states: compound.get_compound("states").cloned().unwrap_or_default(),
                version: compound.get_int("version"),
            },
            None => PaletteEntry {
                name: None,
                states: NbtCompound::new(),
                version: None,
            },
        };
        if entry.name.is_none() {
            debug!(entry = i, "palette entry without a block name");
        }
        palette.push(entry);
    }
    Ok((palette, pos))
}

fn byte_at(value: &[u8], offset: usize) -> Result<u8, DecodeError> {
    ensure_len(value, offset + 1)?;
    Ok(value[offset])
}

fn ensure_len(value: &[u8], len: usize) -> Result<(), DecodeError> {
    if value.len() < len {
        Err(DecodeError::Truncated {
            offset: value.len(),
            needed: len - value.len(),
        })
    } else {
        Ok(())
    }
}
