//! LevelDB key taxonomy: which record a raw key refers to.
//!
//! Chunk keys are `[X:i32_le][Z:i32_le]([dim:i32_le])[tag]([sub])`; everything
//! else is matched against a fixed table of literal names and prefixes.

pub const OVERWORLD: i32 = 0;
pub const NETHER: i32 = 1;
pub const THE_END: i32 = 2;

/// Names for dimension ids 0, 1 and 2.
pub const DIMENSION_NAMES: [&str; 3] = ["overworld", "nether", "the-end"];

/// Old worlds wrote the dimension id as ASCII digits; these are those bytes
/// read back as an `i32_le`.
const LEGACY_NETHER_ID: i32 = 0x3337_3639;
const LEGACY_THE_END_ID: i32 = 0x3237_3639;

pub fn dimension_name(id: i32) -> &'static str {
    usize::try_from(id)
        .ok()
        .and_then(|i| DIMENSION_NAMES.get(i))
        .copied()
        .unwrap_or("unknown")
}

/// Per-chunk record tag, the byte after the coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    Data3D,
    Version,
    Data2D,
    Data2DLegacy,
    SubChunkPrefix,
    LegacyTerrain,
    BlockEntity,
    Entity,
    PendingTicks,
    LegacyBlockExtraData,
    BiomeState,
    FinalizedState,
    ConversionData,
    BorderBlocks,
    HardcodedSpawners,
    RandomTicks,
    CheckSums,
    GenerationSeed,
    GeneratedPreCavesAndCliffsBlending,
    BlendingBiomeHeight,
    MetaDataHash,
    BlendingData,
    ActorDigestVersion,
    LegacyVersion,
    /// A byte in the chunk-tag range with no known meaning.
    Other(u8),
}

impl ChunkTag {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x2B => ChunkTag::Data3D,
            0x2C => ChunkTag::Version,
            0x2D => ChunkTag::Data2D,
            0x2E => ChunkTag::Data2DLegacy,
            0x2F => ChunkTag::SubChunkPrefix,
            0x30 => ChunkTag::LegacyTerrain,
            0x31 => ChunkTag::BlockEntity,
            0x32 => ChunkTag::Entity,
            0x33 => ChunkTag::PendingTicks,
            0x34 => ChunkTag::LegacyBlockExtraData,
            0x35 => ChunkTag::BiomeState,
            0x36 => ChunkTag::FinalizedState,
            0x37 => ChunkTag::ConversionData,
            0x38 => ChunkTag::BorderBlocks,
            0x39 => ChunkTag::HardcodedSpawners,
            0x3A => ChunkTag::RandomTicks,
            0x3B => ChunkTag::CheckSums,
            0x3C => ChunkTag::GenerationSeed,
            0x3D => ChunkTag::GeneratedPreCavesAndCliffsBlending,
            0x3E => ChunkTag::BlendingBiomeHeight,
            0x3F => ChunkTag::MetaDataHash,
            0x40 => ChunkTag::BlendingData,
            0x41 => ChunkTag::ActorDigestVersion,
            0x76 => ChunkTag::LegacyVersion,
            other => ChunkTag::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ChunkTag::Data3D => 0x2B,
            ChunkTag::Version => 0x2C,
            ChunkTag::Data2D => 0x2D,
            ChunkTag::Data2DLegacy => 0x2E,
            ChunkTag::SubChunkPrefix => 0x2F,
            ChunkTag::LegacyTerrain => 0x30,
            ChunkTag::BlockEntity => 0x31,
            ChunkTag::Entity => 0x32,
            ChunkTag::PendingTicks => 0x33,
            ChunkTag::LegacyBlockExtraData => 0x34,
            ChunkTag::BiomeState => 0x35,
            ChunkTag::FinalizedState => 0x36,
            ChunkTag::ConversionData => 0x37,
            ChunkTag::BorderBlocks => 0x38,
            ChunkTag::HardcodedSpawners => 0x39,
            ChunkTag::RandomTicks => 0x3A,
            ChunkTag::CheckSums => 0x3B,
            ChunkTag::GenerationSeed => 0x3C,
            ChunkTag::GeneratedPreCavesAndCliffsBlending => 0x3D,
            ChunkTag::BlendingBiomeHeight => 0x3E,
            ChunkTag::MetaDataHash => 0x3F,
            ChunkTag::BlendingData => 0x40,
            ChunkTag::ActorDigestVersion => 0x41,
            ChunkTag::LegacyVersion => 0x76,
            ChunkTag::Other(b) => b,
        }
    }

    /// Records whose value is a run of concatenated little-endian NBT compounds.
    pub fn is_nbt(self) -> bool {
        matches!(
            self,
            ChunkTag::BlockEntity
                | ChunkTag::Entity
                | ChunkTag::PendingTicks
                | ChunkTag::RandomTicks
        )
    }
}

/// Decoded position and tag of a chunk-scoped key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkKeyInfo {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub dimension_id: i32,
    pub dimension_name: &'static str,
    pub tag: ChunkTag,
    pub sub_tag: Option<u8>,
}

impl ChunkKeyInfo {
    pub fn is_known_dimension(&self) -> bool {
        (OVERWORLD..=THE_END).contains(&self.dimension_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VillageKind {
    Info,
    Players,
    Dwellers,
    Poi,
    Other(String),
}

/// What a store key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Chunk(ChunkKeyInfo),
    BiomeData,
    Overworld,
    Nether,
    TheEnd,
    LocalPlayer,
    RemotePlayer(String),
    FlatWorldLayers,
    Village {
        kind: VillageKind,
        dimension: Option<String>,
        village_id: String,
    },
    AutonomousEntities,
    /// `digp` key; carries the chunk when the key is well formed.
    ActorDigestPointer {
        chunk_x: i32,
        chunk_z: i32,
        dimension_id: i32,
    },
    ActorPrefix(u64),
    LevelChunkMetaDataDictionary,
    MobEvents,
    SchedulerWT,
    Scoreboard,
    Portals,
    Map(String),
    Unknown(Vec<u8>),
}

impl RecordKind {
    /// Short label used for per-kind counters and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Chunk(_) => "chunk",
            RecordKind::BiomeData => "BiomeData",
            RecordKind::Overworld => "Overworld",
            RecordKind::Nether => "Nether",
            RecordKind::TheEnd => "TheEnd",
            RecordKind::LocalPlayer => "~local_player",
            RecordKind::RemotePlayer(_) => "player",
            RecordKind::FlatWorldLayers => "game_flatworldlayers",
            RecordKind::Village { .. } => "village",
            RecordKind::AutonomousEntities => "AutonomousEntities",
            RecordKind::ActorDigestPointer { .. } => "digp",
            RecordKind::ActorPrefix(_) => "actorprefix",
            RecordKind::LevelChunkMetaDataDictionary => "LevelChunkMetaDataDictionary",
            RecordKind::MobEvents => "mobevents",
            RecordKind::SchedulerWT => "schedulerWT",
            RecordKind::Scoreboard => "scoreboard",
            RecordKind::Portals => "portals",
            RecordKind::Map(_) => "map",
            RecordKind::Unknown(_) => "unknown",
        }
    }
}

const EXACT_KEYS: &[(&[u8], RecordKind)] = &[
    (b"BiomeData", RecordKind::BiomeData),
    (b"Overworld", RecordKind::Overworld),
    (b"Nether", RecordKind::Nether),
    (b"TheEnd", RecordKind::TheEnd),
    (b"~local_player", RecordKind::LocalPlayer),
    (b"game_flatworldlayers", RecordKind::FlatWorldLayers),
    (b"AutonomousEntities", RecordKind::AutonomousEntities),
    (
        b"LevelChunkMetaDataDictionary",
        RecordKind::LevelChunkMetaDataDictionary,
    ),
    (b"mobevents", RecordKind::MobEvents),
    (b"schedulerWT", RecordKind::SchedulerWT),
    (b"scoreboard", RecordKind::Scoreboard),
    (b"portals", RecordKind::Portals),
];

/// Classify a raw store key. Never fails: unrecognised keys are `Unknown`.
///
/// Literal names are tried before the chunk-key shape, since short names such
/// as `map_-1234` have a chunk-key length and a digit in the tag position.
pub fn classify(key: &[u8]) -> RecordKind {
    if let Some(kind) = classify_literal(key) {
        return kind;
    }
    if let Some(info) = parse_chunk_key(key) {
        return RecordKind::Chunk(info);
    }
    RecordKind::Unknown(key.to_vec())
}

fn classify_literal(key: &[u8]) -> Option<RecordKind> {
    if let Some((_, kind)) = EXACT_KEYS.iter().find(|(name, _)| *name == key) {
        return Some(kind.clone());
    }
    if let Some(id) = key.strip_prefix(b"player_") {
        return Some(RecordKind::RemotePlayer(
            String::from_utf8_lossy(id).into_owned(),
        ));
    }
    if let Some(rest) = key.strip_prefix(b"VILLAGE_") {
        return Some(parse_village_key(rest).unwrap_or_else(|| RecordKind::Unknown(key.to_vec())));
    }
    if let Some(id) = key.strip_prefix(b"actorprefix") {
        return Some(match <[u8; 8]>::try_from(id) {
            Ok(id) => RecordKind::ActorPrefix(u64::from_le_bytes(id)),
            Err(_) => RecordKind::Unknown(key.to_vec()),
        });
    }
    if let Some(pos) = key.strip_prefix(b"digp") {
        let (chunk_x, chunk_z, dimension_id) = match pos.len() {
            8 => (read_i32(pos, 0), read_i32(pos, 4), OVERWORLD),
            12 => (
                read_i32(pos, 0),
                read_i32(pos, 4),
                normalize_dimension(read_i32(pos, 8)),
            ),
            _ => return Some(RecordKind::Unknown(key.to_vec())),
        };
        return Some(RecordKind::ActorDigestPointer {
            chunk_x,
            chunk_z,
            dimension_id,
        });
    }
    if let Some(id) = key.strip_prefix(b"map_") {
        return Some(RecordKind::Map(String::from_utf8_lossy(id).into_owned()));
    }
    None
}

/// `VILLAGE_[<dimension>_]<uuid>_<INFO|PLAYERS|DWELLERS|POI>`
fn parse_village_key(rest: &[u8]) -> Option<RecordKind> {
    let rest = std::str::from_utf8(rest).ok()?;
    let (head, suffix) = rest.rsplit_once('_')?;
    let kind = match suffix {
        "INFO" => VillageKind::Info,
        "PLAYERS" => VillageKind::Players,
        "DWELLERS" => VillageKind::Dwellers,
        "POI" => VillageKind::Poi,
        other => VillageKind::Other(other.to_string()),
    };
    let (dimension, village_id) = match head.split_once('_') {
        Some((dim, id)) => (Some(dim.to_string()), id.to_string()),
        None => (None, head.to_string()),
    };
    Some(RecordKind::Village {
        kind,
        dimension,
        village_id,
    })
}

/// Parse a chunk key. Returns `None` if the key does not have chunk-key shape.
pub fn parse_chunk_key(key: &[u8]) -> Option<ChunkKeyInfo> {
    let tag_pos = match key.len() {
        9 | 10 => 8,
        13 | 14 => 12,
        _ => return None,
    };
    let tag = key[tag_pos];
    if !((33..=64).contains(&tag) || tag == 118) {
        return None;
    }

    let dimension_id = if tag_pos == 12 {
        normalize_dimension(read_i32(key, 8))
    } else {
        OVERWORLD
    };

    Some(ChunkKeyInfo {
        chunk_x: read_i32(key, 0),
        chunk_z: read_i32(key, 4),
        dimension_id,
        dimension_name: dimension_name(dimension_id),
        tag: ChunkTag::from_byte(tag),
        sub_tag: key.get(tag_pos + 1).copied(),
    })
}

fn normalize_dimension(raw: i32) -> i32 {
    match raw {
        LEGACY_NETHER_ID => NETHER,
        LEGACY_THE_END_ID => THE_END,
        other => other,
    }
}

fn read_i32(key: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([key[at], key[at + 1], key[at + 2], key[at + 3]])
}

// ─── Key builders ───────────────────────────────────────────────────────────

/// Build a dimension-aware chunk key.
///
/// Overworld (dim=0): `[X:i32_le][Z:i32_le][tag]`
/// Other dimensions: `[X:i32_le][Z:i32_le][dim:i32_le][tag]`
pub fn chunk_key(cx: i32, cz: i32, dim: i32, tag: ChunkTag) -> Vec<u8> {
    let cap = if dim == OVERWORLD { 9 } else { 13 };
    let mut key = Vec::with_capacity(cap);
    key.extend_from_slice(&cx.to_le_bytes());
    key.extend_from_slice(&cz.to_le_bytes());
    if dim != OVERWORLD {
        key.extend_from_slice(&dim.to_le_bytes());
    }
    key.push(tag.to_byte());
    key
}

/// Build a dimension-aware sub-chunk key: a chunk key for
/// [`ChunkTag::SubChunkPrefix`] followed by the signed sub-chunk Y index.
pub fn sub_chunk_key(cx: i32, cz: i32, dim: i32, y_index: i8) -> Vec<u8> {
    let mut key = chunk_key(cx, cz, dim, ChunkTag::SubChunkPrefix);
    key.push(y_index as u8);
    key
}
