//! World aggregation: drives a scan over every store record, merging sub-chunks
//! into per-dimension chunk tables and forwarding other decoded records.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::chunk::ChunkColumn;
use crate::dimension::Dimension;
use crate::error::{DecodeError, WorldError};
use crate::key::{
    chunk_key, classify, sub_chunk_key, ChunkKeyInfo, ChunkTag, RecordKind, NETHER, OVERWORLD,
    THE_END,
};
use crate::level::LevelDat;
use crate::records::{decode_record, RecordPayload};
use crate::storage::{LevelDbStore, RecordSource};
use crate::subchunk::decode_subchunk;

/// Default number of records between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Sub-chunk indices probed by [`World::load_chunk`].
const SUBCHUNK_Y_RANGE: std::ops::RangeInclusive<i8> = -4..=19;

/// Shared flag used to stop a running scan between records.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for [`World::scan`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Records between progress events; 0 disables them.
    pub progress_interval: u64,
    /// Total record count, if known, for percentages.
    pub total: Option<u64>,
    /// First key to visit (inclusive). Empty scans from the beginning.
    pub start: Vec<u8>,
    pub cancel: Option<CancelToken>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            total: None,
            start: Vec::new(),
            cancel: None,
        }
    }
}

/// Something the scan hands back to its caller.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    /// A decoded non-sub-chunk record. The world does not keep it.
    Record {
        key: &'a [u8],
        kind: &'a RecordKind,
        payload: RecordPayload,
    },
    Progress { processed: u64, total: Option<u64> },
}

/// A record that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordError {
    pub key: Vec<u8>,
    pub kind: &'static str,
    pub error: DecodeError,
}

/// Summary of one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub records: u64,
    pub chunk_records: u64,
    pub sub_chunks: u64,
    pub nbt_records: u64,
    /// Records seen per [`RecordKind::label`].
    pub per_kind: BTreeMap<&'static str, u64>,
    pub errors: Vec<RecordError>,
    /// Dimension ids found in chunk keys outside overworld, nether and end.
    pub unknown_dimensions: BTreeSet<i32>,
    pub cancelled: bool,
    /// Key of the last record processed.
    pub last_key: Option<Vec<u8>>,
}

impl ScanReport {
    /// Start key for a scan that continues after this one.
    pub fn resume_key(&self) -> Option<Vec<u8>> {
        self.last_key.as_ref().map(|k| {
            let mut next = k.clone();
            next.push(0);
            next
        })
    }

    fn error(&mut self, key: &[u8], kind: &RecordKind, error: DecodeError) {
        debug!(kind = kind.label(), key = ?key, %error, "record failed to decode");
        self.errors.push(RecordError {
            key: key.to_vec(),
            kind: kind.label(),
            error,
        });
    }
}

/// A world save: header values plus the three dimensions.
#[derive(Debug)]
pub struct World {
    pub name: String,
    pub seed: i64,
    pub spawn: (i32, i32, i32),
    pub level: Option<LevelDat>,
    dimensions: [Dimension; 3],
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            spawn: (0, 0, 0),
            level: None,
            dimensions: [
                Dimension::new(OVERWORLD),
                Dimension::new(NETHER),
                Dimension::new(THE_END),
            ],
        }
    }

    /// A world whose header values come from `level.dat`.
    pub fn from_level_dat(level: LevelDat) -> Self {
        let mut world = Self::new(level.level_name.clone());
        world.seed = level.random_seed;
        world.spawn = level.spawn();
        world.level = Some(level);
        world
    }

    /// Open the world directory `dir`: `level.dat`, `levelname.txt` and `db/`.
    pub fn open(dir: &Path) -> Result<(World, LevelDbStore), WorldError> {
        info!("Opening world at {}", dir.display());
        let level = LevelDat::load(&dir.join("level.dat"))?;
        let mut world = World::from_level_dat(level);

        match std::fs::read_to_string(dir.join("levelname.txt")) {
            Ok(name) if !name.trim().is_empty() => world.name = name.trim().to_string(),
            Ok(_) => {}
            Err(e) => debug!("no levelname.txt ({e}), using LevelName"),
        }
        info!("Level name: {}", world.name);
        info!(
            "Spawn: ({}, {}, {}), seed: {}",
            world.spawn.0, world.spawn.1, world.spawn.2, world.seed
        );

        let store = LevelDbStore::open(&dir.join("db"))?;
        Ok((world, store))
    }

    pub fn dimensions(&self) -> &[Dimension; 3] {
        &self.dimensions
    }

    pub fn dimension(&self, id: i32) -> Option<&Dimension> {
        usize::try_from(id).ok().and_then(|i| self.dimensions.get(i))
    }

    pub fn dimension_mut(&mut self, id: i32) -> Option<&mut Dimension> {
        usize::try_from(id).ok().and_then(|i| self.dimensions.get_mut(i))
    }

    /// Block name at world coordinates in dimension `dim`.
    pub fn block_name(&self, dim: i32, x: i32, y: i32, z: i32) -> Option<Result<&str, DecodeError>> {
        let column = self
            .dimension(dim)?
            .chunk(x.div_euclid(16), z.div_euclid(16))?;
        column.block_name(x.rem_euclid(16) as usize, y, z.rem_euclid(16) as usize)
    }

    /// Visit every record in `source`, decoding as it goes.
    ///
    /// Decode failures are collected in the report and never stop the scan;
    /// only a failing store does.
    pub fn scan(
        &mut self,
        source: &mut dyn RecordSource,
        options: &ScanOptions,
        sink: &mut dyn FnMut(ScanEvent<'_>),
    ) -> Result<ScanReport, WorldError> {
        let mut report = ScanReport::default();
        source.for_each(&options.start, &mut |key, value| {
            if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                report.cancelled = true;
                return ControlFlow::Break(());
            }

            self.ingest(key, value, &mut report, sink);
            report.records += 1;
            report.last_key = Some(key.to_vec());

            if options.progress_interval > 0 && report.records % options.progress_interval == 0 {
                log_progress(report.records, options.total);
                sink(ScanEvent::Progress {
                    processed: report.records,
                    total: options.total,
                });
            }
            ControlFlow::Continue(())
        })?;

        if report.cancelled {
            info!("Scan cancelled after {} records", report.records);
        } else {
            info!(
                "Scan complete: {} records, {} sub-chunks, {} errors",
                report.records,
                report.sub_chunks,
                report.errors.len()
            );
        }
        for dim in &mut self.dimensions {
            dim.report_bounds();
        }
        Ok(report)
    }

    fn ingest(
        &mut self,
        key: &[u8],
        value: &[u8],
        report: &mut ScanReport,
        sink: &mut dyn FnMut(ScanEvent<'_>),
    ) {
        let kind = classify(key);
        *report.per_kind.entry(kind.label()).or_default() += 1;

        if let RecordKind::Chunk(info) = &kind {
            trace!(
                "chunk key x={} z={} dim={} tag={:?} sub={:?}",
                info.chunk_x,
                info.chunk_z,
                info.dimension_name,
                info.tag,
                info.sub_tag
            );
            report.chunk_records += 1;
            if !info.is_known_dimension() && report.unknown_dimensions.insert(info.dimension_id) {
                warn!(
                    "unknown chunk dimension id {:#x}; its chunk records are not stored",
                    info.dimension_id
                );
            }
            match info.tag {
                ChunkTag::SubChunkPrefix => {
                    if let Err(error) = self.merge_sub_chunk(info, value, report) {
                        report.error(key, &kind, error);
                    }
                    return;
                }
                ChunkTag::Version | ChunkTag::LegacyVersion => {
                    match (self.dimension_mut(info.dimension_id), value.first()) {
                        (Some(dim), Some(&version)) => {
                            dim.set_format_version(info.chunk_x, info.chunk_z, version)
                        }
                        (None, _) => report.error(
                            key,
                            &kind,
                            DecodeError::UnknownDimensionId(info.dimension_id),
                        ),
                        (_, None) => report.error(
                            key,
                            &kind,
                            DecodeError::Truncated {
                                offset: 0,
                                needed: 1,
                            },
                        ),
                    }
                    return;
                }
                _ => {}
            }
        }

        match decode_record(&kind, value) {
            Ok(RecordPayload::Raw) => {}
            Ok(payload) => {
                if matches!(payload, RecordPayload::Nbt(_)) {
                    report.nbt_records += 1;
                }
                sink(ScanEvent::Record {
                    key,
                    kind: &kind,
                    payload,
                });
            }
            Err(error) => report.error(key, &kind, error),
        }
    }

    /// Decode a sub-chunk record into its column. Cells outside the palette do
    /// not prevent the merge but are reported.
    fn merge_sub_chunk(
        &mut self,
        info: &ChunkKeyInfo,
        value: &[u8],
        report: &mut ScanReport,
    ) -> Result<(), DecodeError> {
        let dim = self
            .dimension_mut(info.dimension_id)
            .ok_or(DecodeError::UnknownDimensionId(info.dimension_id))?;

        match decode_subchunk(value) {
            Ok(sub) => {
                let y_index = info
                    .sub_tag
                    .map(|b| b as i8)
                    .or(sub.y_index)
                    .unwrap_or(0);
                let invalid = sub.first_invalid();
                if let Some(err) = &invalid {
                    warn!(
                        "sub-chunk ({}, {}, {}) in {}: {} cells without a block name",
                        info.chunk_x,
                        y_index,
                        info.chunk_z,
                        info.dimension_name,
                        sub.invalid_cells()
                    );
                    debug!(%err, "first invalid cell");
                }
                dim.add_sub_chunk(info.chunk_x, info.chunk_z, y_index, sub);
                report.sub_chunks += 1;
                invalid.map_or(Ok(()), Err)
            }
            Err(error) => {
                let y_index = info.sub_tag.map_or(0, |b| b as i8);
                dim.add_sub_chunk_error(info.chunk_x, info.chunk_z, y_index, error.clone());
                Err(error)
            }
        }
    }

    /// Decode the column at `(x, z)` of dimension `dim` by direct key lookups.
    ///
    /// Returns `None` when the store has neither a version record nor any
    /// sub-chunk for it.
    pub fn load_chunk(
        &mut self,
        source: &mut dyn RecordSource,
        dim: i32,
        x: i32,
        z: i32,
    ) -> Result<Option<&ChunkColumn>, WorldError> {
        if self.dimension(dim).is_none() {
            warn!("load_chunk: unknown dimension id {dim}");
            return Ok(None);
        }

        let mut keys = vec![
            chunk_key(x, z, dim, ChunkTag::Version),
            chunk_key(x, z, dim, ChunkTag::LegacyVersion),
        ];
        keys.extend(SUBCHUNK_Y_RANGE.map(|y| sub_chunk_key(x, z, dim, y)));

        let mut report = ScanReport::default();
        let mut found = false;
        for key in keys {
            if let Some(value) = source.get(&key)? {
                found = true;
                self.ingest(&key, &value, &mut report, &mut |_| {});
            }
        }
        if !found {
            return Ok(None);
        }
        Ok(self.dimension(dim).and_then(|d| d.chunk(x, z)))
    }
}

fn log_progress(processed: u64, total: Option<u64>) {
    match total {
        Some(total) if total > 0 => info!(
            "processing records: {} / {} ({:.1}%)",
            processed,
            total,
            processed as f64 * 100.0 / total as f64
        ),
        _ => info!("processing records: {}", processed),
    }
}
