//! Ingestion Pipeline
//!
//! Archive → parser → population filter → store, inside one transaction.
//!
//! Every file of the source is loaded in the same transaction. Any parse,
//! read or store failure rolls the whole run back, so the store holds
//! either the previous data or the complete new data, never a mix.

use tracing::{debug, info, warn};

use crate::archive::{ArchiveReader, LineSource};
use crate::config::Config;
use crate::error::Result;
use crate::parser::Records;
use crate::store::{RecordStore, StoreTransaction};

/// Counters for one ingestion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Files read from the archive
    pub files: u64,
    /// Lines read across all files
    pub lines: u64,
    /// Rows upserted
    pub written: u64,
    /// Records below the population threshold
    pub skipped: u64,
}

/// Loads geonames archives into a [`RecordStore`]
pub struct Ingestor<'s, S: RecordStore> {
    store: &'s mut S,
    min_population: u64,
}

impl<'s, S: RecordStore> Ingestor<'s, S> {
    pub fn new(store: &'s mut S, config: &Config) -> Self {
        Self::with_min_population(store, config.min_population)
    }

    pub fn with_min_population(store: &'s mut S, min_population: u64) -> Self {
        Self {
            store,
            min_population,
        }
    }

    /// Fetch or open the archive at `source` and load it
    pub fn ingest(&mut self, source: &str) -> Result<IngestReport> {
        info!(source, min_population = self.min_population, "updating places");
        let mut archive = ArchiveReader::open(source)?;
        self.ingest_from(&mut archive)
    }

    /// Load every file of `source` in a single transaction
    pub fn ingest_from<L: LineSource>(&mut self, source: &mut L) -> Result<IngestReport> {
        let min_population = self.min_population;
        let mut txn = self.store.begin()?;

        match load(&mut txn, source, min_population) {
            Ok(report) => {
                txn.commit()?;
                info!(
                    files = report.files,
                    written = report.written,
                    skipped = report.skipped,
                    "update committed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "update failed, rolling back");
                if let Err(rollback_err) = txn.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

fn load<T, L>(txn: &mut T, source: &mut L, min_population: u64) -> Result<IngestReport>
where
    T: StoreTransaction,
    L: LineSource,
{
    let mut report = IngestReport::default();

    while let Some(file) = source.next_file() {
        let (name, lines) = file?.into_parts();
        debug!(file = %name, "reading file");

        let mut records = Records::new(name, lines);
        for raw in records.by_ref() {
            let raw = raw?;
            if raw.population < min_population {
                report.skipped += 1;
                continue;
            }
            txn.upsert(raw.into_place())?;
            report.written += 1;
        }

        report.lines += records.lines_read();
        report.files += 1;
    }

    Ok(report)
}
