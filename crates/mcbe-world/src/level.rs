//! `level.dat`: an 8-byte header followed by one little-endian NBT compound.

use std::path::Path;

use mcbe_nbt::{Endian, NbtCompound};
use tracing::{debug, info};

use crate::error::WorldError;

/// World settings read from `level.dat`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelDat {
    /// Format version from the file header.
    pub header_version: i32,
    pub level_name: String,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub spawn_z: i32,
    pub random_seed: i64,
    pub game_type: i32,
    pub generator: i32,
    pub storage_version: i32,
    pub last_played: i64,
    /// The whole root compound, for fields not lifted out above.
    pub nbt: NbtCompound,
}

impl LevelDat {
    /// Parse the contents of a `level.dat` file.
    pub fn parse(data: &[u8]) -> Result<Self, WorldError> {
        if data.len() < 8 {
            return Err(WorldError::LevelDatTooShort {
                len: data.len(),
                declared: 0,
            });
        }
        let header_version = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let declared = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        debug!(header_version, declared, "level.dat header");
        if data.len() - 8 < declared {
            return Err(WorldError::LevelDatTooShort {
                len: data.len(),
                declared,
            });
        }

        let (root, _) = mcbe_nbt::decode(&data[8..8 + declared], Endian::Little)?;
        let c = root.compound().cloned().unwrap_or_default();

        Ok(Self {
            header_version,
            level_name: c
                .get("LevelName")
                .and_then(|t| t.as_nbt_string())
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            spawn_x: c.get_int("SpawnX").unwrap_or(0),
            spawn_y: c.get_int("SpawnY").unwrap_or(64),
            spawn_z: c.get_int("SpawnZ").unwrap_or(0),
            random_seed: c.get_long("RandomSeed").unwrap_or(0),
            game_type: c.get_int("GameType").unwrap_or(0),
            generator: c.get_int("Generator").unwrap_or(1),
            storage_version: c.get_int("StorageVersion").unwrap_or(0),
            last_played: c.get_long("LastPlayed").unwrap_or(0),
            nbt: c,
        })
    }

    /// Load `level.dat` from a file.
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let data = std::fs::read(path).map_err(|source| WorldError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Reading {} ({} bytes)", path.display(), data.len());
        Self::parse(&data)
    }

    pub fn spawn(&self) -> (i32, i32, i32) {
        (self.spawn_x, self.spawn_y, self.spawn_z)
    }
}
