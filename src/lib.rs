//! # placetime
//!
//! Current local time for places around the world, searched from a local
//! copy of a geonames dump:
//! - Streaming ingestion of zipped geonames dumps (URL or path)
//! - Transactional place store with a write-ahead log
//! - Case-insensitive multi-term search with live timezone conversion
//!
//! ## Architecture Overview
//!
//! ```text
//!   update                                   search
//!     │                                         │
//! ┌───▼──────────┐   ┌──────────┐       ┌──────▼───────┐
//! │   Archive    │──▶│  Parser  │       │ SearchEngine │──▶ ResultSink
//! │ (zip/http)   │   └────┬─────┘       │  + matcher   │    (text/JSON)
//! └──────────────┘        │             └──────▲───────┘
//!                  ┌──────▼─────┐              │
//!                  │  Ingestor  │              │ scan
//!                  │ (1 txn)    │              │
//!                  └──────┬─────┘              │
//!                         │ upsert             │
//!                  ┌──────▼────────────────────┴──┐
//!                  │          RecordStore          │
//!                  │   WAL ─▶ MemTable ─▶ SSTables │
//!                  └───────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod archive;
pub mod country;
pub mod ingest;
pub mod matcher;
pub mod memtable;
pub mod output;
pub mod parser;
pub mod record;
pub mod search;
pub mod storage;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{PlaceTimeError, Result};
pub use ingest::{IngestReport, Ingestor};
pub use record::{GeonamesRawRecord, PlaceRecord};
pub use search::{SearchEngine, SearchResult};
pub use store::{DiskStore, MemoryStore, RecordStore, StoreTransaction};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of placetime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
