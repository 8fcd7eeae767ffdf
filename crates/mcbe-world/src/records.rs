//! Decoding of non-sub-chunk record values.

use mcbe_nbt::{Endian, NbtRoot};

use crate::error::DecodeError;
use crate::key::RecordKind;

/// Decoded value of one store record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    /// One or more concatenated little-endian NBT values.
    Nbt(Vec<NbtRoot>),
    /// Actor ids listed by a `digp` record.
    ActorDigest(Vec<u64>),
    /// `LevelChunkMetaDataDictionary`: metadata compounds keyed by hash.
    MetaDataDictionary(Vec<(u64, NbtRoot)>),
    /// Plain-text value (`game_flatworldlayers` holds JSON text).
    Text(String),
    /// Values this layer does not interpret (sub-chunks, heightmaps, ...).
    Raw,
}

impl RecordPayload {
    pub fn nbt(&self) -> Option<&[NbtRoot]> {
        match self {
            RecordPayload::Nbt(roots) => Some(roots),
            _ => None,
        }
    }
}

/// Whether the record's value is decoded as NBT.
pub fn is_nbt(kind: &RecordKind) -> bool {
    match kind {
        RecordKind::Chunk(info) => info.tag.is_nbt(),
        RecordKind::BiomeData
        | RecordKind::Overworld
        | RecordKind::Nether
        | RecordKind::TheEnd
        | RecordKind::LocalPlayer
        | RecordKind::RemotePlayer(_)
        | RecordKind::Village { .. }
        | RecordKind::AutonomousEntities
        | RecordKind::ActorPrefix(_)
        | RecordKind::MobEvents
        | RecordKind::SchedulerWT
        | RecordKind::Scoreboard
        | RecordKind::Portals
        | RecordKind::Map(_) => true,
        _ => false,
    }
}

/// Decode a record value according to its key's kind.
pub fn decode_record(kind: &RecordKind, value: &[u8]) -> Result<RecordPayload, DecodeError> {
    if is_nbt(kind) {
        return Ok(RecordPayload::Nbt(mcbe_nbt::decode_all(value, Endian::Little)?));
    }
    match kind {
        RecordKind::ActorDigestPointer { .. } => {
            parse_actor_digest(value).map(RecordPayload::ActorDigest)
        }
        RecordKind::LevelChunkMetaDataDictionary => {
            parse_metadata_dictionary(value).map(RecordPayload::MetaDataDictionary)
        }
        RecordKind::FlatWorldLayers => Ok(RecordPayload::Text(
            String::from_utf8_lossy(value).into_owned(),
        )),
        _ => Ok(RecordPayload::Raw),
    }
}

/// Split a `digp` value into little-endian actor ids.
pub fn parse_actor_digest(value: &[u8]) -> Result<Vec<u64>, DecodeError> {
    let chunks = value.chunks_exact(8);
    let tail = chunks.remainder().len();
    if tail != 0 {
        return Err(DecodeError::Truncated {
            offset: value.len(),
            needed: 8 - tail,
        });
    }
    Ok(chunks
        .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

/// Decode `[count:u32_le]` then `count` pairs of `[hash:u64_le][NBT compound]`.
pub fn parse_metadata_dictionary(value: &[u8]) -> Result<Vec<(u64, NbtRoot)>, DecodeError> {
    let count = read_array::<4>(value, 0).map(u32::from_le_bytes)? as usize;
    let mut pos = 4;
    let mut entries = Vec::with_capacity(count.min(value.len() / 9));
    for _ in 0..count {
        let hash = read_array::<8>(value, pos).map(u64::from_le_bytes)?;
        pos += 8;
        let (root, consumed) =
            mcbe_nbt::decode(&value[pos..], Endian::Little).map_err(|e| DecodeError::from(e).at(pos))?;
        pos += consumed;
        entries.push((hash, root));
    }
    Ok(entries)
}

fn read_array<const N: usize>(value: &[u8], at: usize) -> Result<[u8; N], DecodeError> {
    value
        .get(at..at + N)
        .and_then(|b| b.try_into().ok())
        .ok_or(DecodeError::Truncated {
            offset: value.len().min(at),
            needed: (at + N).saturating_sub(value.len()),
        })
}
