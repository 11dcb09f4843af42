//! Configuration for placetime
//!
//! Centralized configuration with sensible defaults. A single `Config` is
//! built once (usually from CLI flags) and handed to the store, the
//! ingestion pipeline and the search engine.

use std::path::PathBuf;

use crate::error::{PlaceTimeError, Result};

/// Geonames dump used when no source is given
pub const DEFAULT_SOURCE: &str = "https://download.geonames.org/export/dump/cities15000.zip";

/// Places below this population are skipped by default
pub const DEFAULT_MIN_POPULATION: u64 = 50_000;

/// Main configuration for a placetime instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log of the open transaction)
    ///     └── sstables/        (sorted place tables)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync the WAL while a transaction is open
    pub wal_sync_strategy: WalSyncStrategy,

    /// Table files allowed before a commit merges them into one
    pub max_sstables: usize,

    // -------------------------------------------------------------------------
    // Ingestion Configuration
    // -------------------------------------------------------------------------
    /// URL (http/https) or local path of the geonames zip archive
    pub source: String,

    /// Places with a smaller population are not written
    pub min_population: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (commit always syncs)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./placetime_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 1000 },
            max_sstables: 4,
            source: DEFAULT_SOURCE.to_string(),
            min_population: DEFAULT_MIN_POPULATION,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_sstables == 0 {
            return Err(PlaceTimeError::Config(
                "max_sstables must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(PlaceTimeError::Config(
                "WAL sync interval must be at least 1 entry".to_string(),
            ));
        }
        if self.source.trim().is_empty() {
            return Err(PlaceTimeError::Config("source must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set how many table files may accumulate before compaction
    pub fn max_sstables(mut self, count: usize) -> Self {
        self.config.max_sstables = count;
        self
    }

    /// Set the archive source (URL or path)
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.source = source.into();
        self
    }

    /// Set the minimum population threshold
    pub fn min_population(mut self, population: u64) -> Self {
        self.config.min_population = population;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
