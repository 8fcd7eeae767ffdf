//! NBT error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NbtError {
    #[error("truncated NBT data at offset {offset} (needed {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid tag type {tag} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },

    #[error("negative length {len} at offset {offset}")]
    NegativeLength { len: i32, offset: usize },

    #[error("nesting too deep (limit: {limit})")]
    RecursionLimitExceeded { limit: usize },
}
