//! Storage Manager
//!
//! Manages the table files of one store directory.
//!
//! ## Responsibilities
//! - Discover existing table files on startup
//! - Search tables newest → oldest for reads
//! - Create new tables from committed MemTables
//! - Merge all tables into one (compaction)

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{PlaceTimeError, Result};
use crate::memtable::MemTable;
use crate::record::PlaceRecord;

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock; lookups need the write side because
///   `SSTableReader` seeks its file handle
/// - `next_sstable_id`: Atomic counter
pub struct StorageManager {
    data_dir: PathBuf,

    /// Open table readers, ordered newest → oldest
    sstables: RwLock<Vec<SSTableReader>>,

    /// Next ID for creating new tables
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// Leftover `.tmp` files from an interrupted flush are removed.
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;
        Self::load(path, false)
    }

    /// Open existing tables without touching the directory
    ///
    /// A missing directory reads as an empty store. Temp files are left
    /// alone since another process may be writing them.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                data_dir: path.to_path_buf(),
                sstables: RwLock::new(Vec::new()),
                next_sstable_id: AtomicU64::new(1),
            });
        }
        Self::load(path, true)
    }

    fn load(path: &Path, read_only: bool) -> Result<Self> {
        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if file_path.extension().is_some_and(|ext| ext == "tmp") {
                if !read_only {
                    debug!(path = %file_path.display(), "removing unfinished table");
                    fs::remove_file(&file_path)?;
                }
            } else if let Some(id) = Self::parse_sstable_id(&file_path) {
                sstable_ids.push(id);
            }
        }

        // Newest first
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for id in &sstable_ids {
            sstables.push(SSTableReader::open(&Self::sstable_path_with_dir(path, *id))?);
        }

        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Get a row by id (searches all tables newest → oldest)
    pub fn get(&self, id: &str) -> Result<Option<PlaceRecord>> {
        let mut sstables = self.sstables.write();

        for reader in sstables.iter_mut() {
            if !reader.might_contain(id.as_bytes()) {
                continue;
            }
            if let Some(record) = reader.get(id)? {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }

    /// Every row, newest version per id, in ascending id order
    pub fn scan(&self) -> Result<Vec<PlaceRecord>> {
        let mut sstables = self.sstables.write();
        let mut merged: BTreeMap<String, PlaceRecord> = BTreeMap::new();

        for reader in sstables.iter_mut() {
            for row in reader.iter()? {
                let row = row?;
                merged.entry(row.id.clone()).or_insert(row);
            }
        }

        Ok(merged.into_values().collect())
    }

    /// Number of distinct ids across all tables
    pub fn len(&self) -> usize {
        let sstables = self.sstables.read();
        if let [only] = sstables.as_slice() {
            return only.entry_count() as usize;
        }
        sstables
            .iter()
            .flat_map(|reader| reader.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.sstables.read().iter().all(|r| r.entry_count() == 0)
    }

    /// Write a MemTable to a new table file
    ///
    /// Creates the file from the MemTable's sorted rows, opens a reader
    /// for it and puts it at the front of the list.
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(PlaceTimeError::Store("Cannot flush empty MemTable".to_string()));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for record in memtable.iter() {
            builder.add(record)?;
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, reader);

        debug!(
            path = %path.display(),
            rows = metadata.entry_count,
            bytes = metadata.file_size,
            "flushed table"
        );
        Ok(metadata)
    }

    /// Merge every table into a single new one and delete the old files
    ///
    /// The merged table gets the highest id, so if the process dies before
    /// the old files are removed the newest rows still win.
    pub fn compact(&self) -> Result<Option<SSTable>> {
        let mut sstables = self.sstables.write();
        if sstables.len() < 2 {
            return Ok(None);
        }

        let mut merged: BTreeMap<String, PlaceRecord> = BTreeMap::new();
        for reader in sstables.iter_mut() {
            for row in reader.iter()? {
                let row = row?;
                merged.entry(row.id.clone()).or_insert(row);
            }
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);
        let mut builder = SSTableBuilder::new(&path)?;
        for record in merged.values() {
            builder.add(record)?;
        }
        let metadata = builder.finish()?;
        let reader = SSTableReader::open(&path)?;

        let old = std::mem::replace(&mut *sstables, vec![reader]);
        let replaced = old.len();
        for reader in old {
            let old_path = reader.path().to_path_buf();
            drop(reader);
            fs::remove_file(&old_path)?;
        }

        info!(
            merged = replaced,
            rows = metadata.entry_count,
            "compacted tables"
        );
        Ok(Some(metadata))
    }

    /// Get the number of table files
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the next table ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        name.strip_prefix("sstable_")?.parse().ok()
    }
}
