//! Disk Store
//!
//! The durable record store: coordinates the WAL, the staging MemTable and
//! the table files.
//!
//! ## Write path
//! 1. `begin` logs `Begin`
//! 2. `upsert` logs the row and stages it in a MemTable
//! 3. `commit` logs `Commit` and fsyncs; this is the commit point
//! 4. staged rows are flushed to a new table file, then the WAL is truncated
//!
//! A crash between 3 and 4 is repaired on the next `open`, which replays
//! committed transactions from the WAL. Anything without a `Commit` is
//! dropped.
//!
//! A writable store holds an exclusive lock on `{data_dir}/LOCK` until it is
//! dropped, so two updates never share a WAL. Read-only stores take no lock.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PlaceTimeError, Result};
use crate::memtable::MemTable;
use crate::record::PlaceRecord;
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};

use super::{RecordStore, StoreTransaction};

/// Durable place store rooted at `config.data_dir`
pub struct DiskStore {
    config: Config,

    /// Directory for table files
    storage_dir: PathBuf,

    /// Log of the currently open transaction; `None` when read-only
    wal: Option<WalWriter>,
    wal_path: PathBuf,

    /// Committed rows on disk
    storage: StorageManager,

    next_txn_id: u64,

    /// Held for the lifetime of a writable store; the lock is released on drop
    _lock: Option<File>,
}

impl DiskStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";
    const LOCK_FILENAME: &'static str = "LOCK";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory and take the writer lock
    /// 2. Load existing table files
    /// 3. Replay committed transactions left in the WAL and flush them
    /// 4. Truncate the WAL
    ///
    /// Fails with [`PlaceTimeError::Store`] while another writable store holds
    /// the same directory.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        let lock = Self::acquire_lock(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;

        if wal_path.exists() {
            let (records, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                info!(
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    committed = recovery.transactions_committed,
                    discarded = recovery.transactions_discarded,
                    last_lsn = recovery.last_lsn,
                    "WAL recovery"
                );
            }

            let mut memtable = MemTable::new();
            for record in records {
                memtable.put(record);
            }
            if !memtable.is_empty() {
                info!(rows = memtable.entry_count(), "flushing recovered rows");
                storage.flush(&memtable)?;
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        // Recovered data is durable in table files now
        wal.truncate()?;

        Ok(Self {
            config,
            storage_dir,
            wal: Some(wal),
            wal_path,
            storage,
            next_txn_id: 1,
            _lock: Some(lock),
        })
    }

    /// Open committed tables for reading only
    ///
    /// The WAL is neither replayed nor truncated, so this is safe while an
    /// update runs in another process. `begin` fails on such a store.
    pub fn open_read_only(config: Config) -> Result<Self> {
        config.validate()?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let storage = StorageManager::open_read_only(&storage_dir)?;

        Ok(Self {
            config,
            storage_dir,
            wal: None,
            wal_path,
            storage,
            next_txn_id: 1,
            _lock: None,
        })
    }

    fn acquire_lock(data_dir: &Path) -> Result<File> {
        let path = data_dir.join(Self::LOCK_FILENAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|e| {
            PlaceTimeError::Store(format!(
                "{} is in use by another update: {}",
                data_dir.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "writer lock acquired");
        Ok(file)
    }

    /// Merge table files if more than `max_sstables` have piled up
    fn maybe_compact(&self) -> Result<()> {
        if self.storage.sstable_count() > self.config.max_sstables {
            self.storage.compact()?;
        }
        Ok(())
    }

    fn wal_mut(&mut self) -> Result<&mut WalWriter> {
        self.wal
            .as_mut()
            .ok_or_else(|| PlaceTimeError::Store("store is opened read-only".to_string()))
    }

    /// Sync the WAL and close the store
    pub fn close(mut self) -> Result<()> {
        match self.wal.as_mut() {
            Some(wal) => wal.sync(),
            None => Ok(()),
        }
    }

    /// Drop the log of an unfinished transaction
    fn discard_wal(&mut self, txn_id: u64) {
        if let Some(wal) = self.wal.as_mut() {
            if let Err(e) = wal.truncate() {
                warn!(txn_id, error = %e, "WAL truncate failed");
            }
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Where table files are stored
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Path of the write-ahead log
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    pub fn is_read_only(&self) -> bool {
        self.wal.is_none()
    }

    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }
}

impl RecordStore for DiskStore {
    type Txn<'a> = DiskTransaction<'a>;

    fn begin(&mut self) -> Result<Self::Txn<'_>> {
        let txn_id = self.next_txn_id;
        self.next_txn_id += 1;

        self.wal_mut()?.append(txn_id, Operation::Begin)?;
        debug!(txn_id, "transaction started");

        Ok(DiskTransaction {
            store: self,
            txn_id,
            staged: MemTable::new(),
            finished: false,
        })
    }

    fn get(&self, id: &str) -> Result<Option<PlaceRecord>> {
        self.storage.get(id)
    }

    fn scan(&self) -> Result<Vec<PlaceRecord>> {
        self.storage.scan()
    }

    fn len(&self) -> Result<usize> {
        Ok(self.storage.len())
    }
}

/// Write transaction on a [`DiskStore`]
pub struct DiskTransaction<'a> {
    store: &'a mut DiskStore,
    txn_id: u64,
    staged: MemTable,
    /// Set once committed or rolled back
    finished: bool,
}

impl DiskTransaction<'_> {
    /// Rows staged so far (repeated ids count once)
    pub fn staged_count(&self) -> usize {
        self.staged.entry_count()
    }

    /// Staged row by id, if any
    pub fn staged(&self, id: &str) -> Option<&PlaceRecord> {
        self.staged.get(id)
    }

    /// Log the commit and flush staged rows; the rows are durable on success
    fn make_durable(&mut self) -> Result<()> {
        let wal = self.store.wal_mut()?;
        wal.append(self.txn_id, Operation::Commit)?;
        wal.sync()?;

        if !self.staged.is_empty() {
            self.store.storage.flush(&self.staged)?;
        }
        Ok(())
    }
}

impl StoreTransaction for DiskTransaction<'_> {
    fn upsert(&mut self, record: PlaceRecord) -> Result<()> {
        self.store.wal_mut()?.append(
            self.txn_id,
            Operation::Upsert {
                record: record.clone(),
            },
        )?;
        self.staged.put(record);
        Ok(())
    }

    fn commit(mut self) -> Result<()> {
        self.finished = true;
        let rows = self.staged.entry_count();

        if let Err(e) = self.make_durable() {
            // Without the log the commit never happened
            self.store.discard_wal(self.txn_id);
            return Err(e);
        }

        // The rows are in a table file; a stale log is replayed harmlessly on next open
        self.store.discard_wal(self.txn_id);
        if let Err(e) = self.store.maybe_compact() {
            warn!(error = %e, "compaction failed");
        }

        info!(
            txn_id = self.txn_id,
            rows,
            bytes = self.staged.size(),
            "transaction committed"
        );
        Ok(())
    }

    fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.store.wal_mut()?.truncate()?;
        debug!(txn_id = self.txn_id, "transaction rolled back");
        Ok(())
    }
}

impl Drop for DiskTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(txn_id = self.txn_id, "transaction dropped without commit, rolling back");
        self.store.discard_wal(self.txn_id);
    }
}
