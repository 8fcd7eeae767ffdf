//! Error types for record decoding and world opening.

use std::path::PathBuf;

use mcbe_nbt::NbtError;
use thiserror::Error;

/// A failure decoding one record or one cell. Never fatal to a scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated data at offset {offset} (needed {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid NBT tag type {tag} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },

    #[error("negative length {len} at offset {offset}")]
    NegativeLength { len: i32, offset: usize },

    #[error("nesting too deep (limit: {limit})")]
    RecursionLimitExceeded { limit: usize },

    #[error("unsupported sub-chunk version {0:#04x}")]
    UnsupportedSubchunkVersion(u8),

    #[error("unsupported block storage header {0:#04x}")]
    UnsupportedPaletteWidth(u8),

    #[error("palette index {index} out of range (palette has {len} entries)")]
    PaletteIndexOutOfRange { index: u32, len: usize },

    #[error("unknown dimension id {0:#x}")]
    UnknownDimensionId(i32),

    #[error("palette entry {0} has no block name")]
    MissingBlockName(usize),
}

impl DecodeError {
    /// Shift a relative offset by `base`, for errors raised on a sub-slice.
    pub(crate) fn at(self, base: usize) -> Self {
        match self {
            DecodeError::Truncated { offset, needed } => DecodeError::Truncated {
                offset: offset + base,
                needed,
            },
            DecodeError::InvalidTag { tag, offset } => DecodeError::InvalidTag {
                tag,
                offset: offset + base,
            },
            DecodeError::NegativeLength { len, offset } => DecodeError::NegativeLength {
                len,
                offset: offset + base,
            },
            other => other,
        }
    }
}

impl From<NbtError> for DecodeError {
    fn from(err: NbtError) -> Self {
        match err {
            NbtError::Truncated { offset, needed } => DecodeError::Truncated { offset, needed },
            NbtError::InvalidTag { tag, offset } => DecodeError::InvalidTag { tag, offset },
            NbtError::NegativeLength { len, offset } => DecodeError::NegativeLength { len, offset },
            NbtError::RecursionLimitExceeded { limit } => {
                DecodeError::RecursionLimitExceeded { limit }
            }
        }
    }
}

/// Fatal failures opening a world or reading its store.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("LevelDB error: {0}")]
    Store(String),

    #[error("level.dat is too short ({len} bytes, header declares {declared})")]
    LevelDatTooShort { len: usize, declared: usize },

    #[error("level.dat NBT: {0}")]
    LevelDatNbt(#[from] NbtError),
}
