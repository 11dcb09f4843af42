//! WAL Recovery
//!
//! Handles crash recovery by replaying committed transactions from the WAL.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;

use tracing::warn;

use crate::error::{PlaceTimeError, Result};
use crate::record::PlaceRecord;

use super::entry::Operation;
use super::reader::WalReader;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully read
    pub entries_recovered: u64,

    /// Number of corrupted entries found (reading stops at the first one)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,

    /// Transactions with a `Commit` entry
    pub transactions_committed: u64,

    /// Transactions that never committed and were dropped
    pub transactions_discarded: u64,
}

/// Everything a scan of the log produced
struct Scan {
    records: Vec<PlaceRecord>,
    result: RecoveryResult,
    valid_len: u64,
}

impl WalRecovery {
    /// Recover committed rows from a WAL file
    ///
    /// This will:
    /// 1. Read entries up to the first torn or corrupted one
    /// 2. Truncate the file after the last valid entry
    /// 3. Return the upserts of committed transactions, in commit order
    pub fn recover(path: &Path) -> Result<(Vec<PlaceRecord>, RecoveryResult)> {
        let mut scan = Self::scan(path)?;

        if scan.result.entries_corrupted > 0 {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
            scan.result.was_truncated = true;
        }

        Ok((scan.records, scan.result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Ok(Self::scan(path)?.result)
    }

    fn scan(path: &Path) -> Result<Scan> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();
        let mut open: BTreeMap<u64, Vec<PlaceRecord>> = BTreeMap::new();
        let mut records = Vec::new();

        loop {
            let entry = match reader.next_entry() {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(PlaceTimeError::WalCorruption(reason)) => {
                    warn!(path = %path.display(), %reason, "WAL tail is corrupt");
                    result.entries_corrupted += 1;
                    break;
                }
                Err(e) => return Err(e),
            };

            result.entries_recovered += 1;
            result.last_lsn = entry.lsn;

            match entry.operation {
                Operation::Begin => {
                    open.entry(entry.txn_id).or_default();
                }
                Operation::Upsert { record } => {
                    open.entry(entry.txn_id).or_default().push(record);
                }
                Operation::Commit => {
                    records.extend(open.remove(&entry.txn_id).unwrap_or_default());
                    result.transactions_committed += 1;
                }
            }
        }

        result.transactions_discarded = open.len() as u64;

        Ok(Scan {
            records,
            result,
            valid_len: reader.position(),
        })
    }
}
