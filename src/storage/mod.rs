//! Storage Module
//!
//! Persistent place tables in an SSTable-like format.
//!
//! ## Responsibilities
//! - Persist committed rows to disk in id order
//! - Point lookups and full scans across table files (newest row wins)
//! - Merge table files once too many have accumulated
//!
//! ## File Format (V1 - Simple)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(2)│ Entry Count  │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Data Block                             │
//! │ ┌────────┬────────┬─────┬───────────┐ │
//! │ │KeyLen  │ValLen  │ Id  │  Record   │ │
//! │ └────────┴────────┴─────┴───────────┘ │
//! │ ... (repeated for each row)           │
//! ├────────────────────────────────────────┤
//! │ Index Block                            │
//! ├────────────────────────────────────────┤
//! │ Footer                                 │
//! │ ┌──────────────────┬─────────────────┐ │
//! │ │ Index Offset     │    CRC32        │ │
//! │ └──────────────────┴─────────────────┘ │
//! └────────────────────────────────────────┘
//! ```

mod manager;
mod sstable;

pub use manager::StorageManager;
pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
