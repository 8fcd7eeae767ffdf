//! Record sources: the sorted key-value store behind a world.
//!
//! [`LevelDbStore`] reads a world's `db/` directory through rusty-leveldb with
//! Bedrock's two block compressors registered. [`MemoryStore`] is an ordered
//! in-memory map with the same interface.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use rusty_leveldb::compressor::{Compressor, CompressorId, NoneCompressor, SnappyCompressor};
use rusty_leveldb::{CompressorList, LdbIterator, Options, Status, StatusCode, DB};
use tracing::debug;

use crate::error::WorldError;

/// Visitor over `(key, value)` pairs; return `ControlFlow::Break` to stop early.
pub type RecordVisitor<'a> = dyn FnMut(&[u8], &[u8]) -> ControlFlow<()> + 'a;

/// A sorted key-value sequence.
pub trait RecordSource {
    /// Visit every record with `key >= start`, in key order.
    fn for_each(&mut self, start: &[u8], visitor: &mut RecordVisitor<'_>) -> Result<(), WorldError>;

    /// Look up a single key.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, WorldError>;
}

/// Count all records, for progress percentages.
pub fn count_records(source: &mut dyn RecordSource) -> Result<u64, WorldError> {
    let mut count = 0u64;
    source.for_each(&[], &mut |_, _| {
        count += 1;
        ControlFlow::Continue(())
    })?;
    debug!("counted {count} records");
    Ok(count)
}

// ─── Bedrock block compressors ──────────────────────────────────────────────

/// zlib-wrapped deflate, compressor id 2.
pub struct ZlibCompressor(u32);

impl CompressorId for ZlibCompressor {
    const ID: u8 = 2;
}

impl Compressor for ZlibCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::new(self.0));
        enc.write_all(&block).map_err(compression_error)?;
        enc.finish().map_err(compression_error)
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        ZlibDecoder::new(&block[..])
            .read_to_end(&mut out)
            .map_err(compression_error)?;
        Ok(out)
    }
}

/// Raw deflate without a zlib header, compressor id 4. Written by current
/// Bedrock versions.
pub struct RawDeflateCompressor(u32);

impl CompressorId for RawDeflateCompressor {
    const ID: u8 = 4;
}

impl Compressor for RawDeflateCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::new(self.0));
        enc.write_all(&block).map_err(compression_error)?;
        enc.finish().map_err(compression_error)
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        DeflateDecoder::new(&block[..])
            .read_to_end(&mut out)
            .map_err(compression_error)?;
        Ok(out)
    }
}

fn compression_error(err: std::io::Error) -> Status {
    Status::new(StatusCode::Corruption, &err.to_string())
}

/// LevelDB options able to read and write Bedrock world databases.
pub fn bedrock_options(create_if_missing: bool) -> Options {
    let mut list = CompressorList::new();
    list.set(NoneCompressor);
    list.set(SnappyCompressor);
    list.set(ZlibCompressor(6));
    list.set(RawDeflateCompressor(6));
    Options {
        create_if_missing,
        compressor: RawDeflateCompressor::ID,
        compressor_list: Rc::new(list),
        ..Options::default()
    }
}

// ─── LevelDB store ──────────────────────────────────────────────────────────

/// A world database opened with rusty-leveldb.
pub struct LevelDbStore {
    db: DB,
    path: PathBuf,
}

impl LevelDbStore {
    /// Open an existing database. Fails if `path` holds none.
    pub fn open(path: &Path) -> Result<Self, WorldError> {
        Self::open_with(path, bedrock_options(false))
    }

    /// Open a database, creating it if needed.
    pub fn create(path: &Path) -> Result<Self, WorldError> {
        Self::open_with(path, bedrock_options(true))
    }

    fn open_with(path: &Path, opts: Options) -> Result<Self, WorldError> {
        let db = DB::open(path, opts).map_err(|e| {
            WorldError::Store(format!("failed to open LevelDB at {}: {e}", path.display()))
        })?;
        debug!("opened LevelDB at {}", path.display());
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), WorldError> {
        self.db
            .put(key, value)
            .map_err(|e| WorldError::Store(format!("put: {e}")))
    }

    /// Flush pending writes to disk.
    pub fn flush(&mut self) -> Result<(), WorldError> {
        self.db
            .flush()
            .map_err(|e| WorldError::Store(format!("flush: {e}")))
    }
}

impl RecordSource for LevelDbStore {
    fn for_each(&mut self, start: &[u8], visitor: &mut RecordVisitor<'_>) -> Result<(), WorldError> {
        let mut iter = self
            .db
            .new_iter()
            .map_err(|e| WorldError::Store(format!("iterator: {e}")))?;
        if !start.is_empty() {
            // seek leaves the iterator on the first key >= start; next() would skip it
            iter.seek(start);
            let (mut k, mut v) = (Vec::new(), Vec::new());
            if !iter.current(&mut k, &mut v) || visitor(&k[..], &v[..]).is_break() {
                return Ok(());
            }
        }
        while let Some((k, v)) = iter.next() {
            if visitor(&k[..], &v[..]).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, WorldError> {
        Ok(self.db.get(key))
    }
}

// ─── In-memory store ────────────────────────────────────────────────────────

/// Ordered in-memory records.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.records.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        for (k, v) in iter {
            store.insert(k, v);
        }
        store
    }
}

impl RecordSource for MemoryStore {
    fn for_each(&mut self, start: &[u8], visitor: &mut RecordVisitor<'_>) -> Result<(), WorldError> {
        for (k, v) in self.records.range(start.to_vec()..) {
            if visitor(k.as_slice(), v.as_slice()).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, WorldError> {
        Ok(self.records.get(key).cloned())
    }
}
