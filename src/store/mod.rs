//! Record Store
//!
//! The place table behind ingestion and search, expressed as two traits so
//! the pipeline and the search engine get their storage injected.
//!
//! - [`DiskStore`]: durable store (WAL + sorted table files)
//! - [`MemoryStore`]: in-process store with the same transaction semantics
//!
//! A transaction stages upserts and makes them visible all at once on
//! `commit`. `rollback`, or dropping the transaction, discards them.

mod disk;
mod memory;

use crate::error::Result;
use crate::record::PlaceRecord;

pub use disk::{DiskStore, DiskTransaction};
pub use memory::{MemoryStore, MemoryTransaction};

/// Durable table of place rows keyed by id
pub trait RecordStore {
    type Txn<'a>: StoreTransaction
    where
        Self: 'a;

    /// Start a write transaction; only one can be open at a time
    fn begin(&mut self) -> Result<Self::Txn<'_>>;

    /// Look up a committed row
    fn get(&self, id: &str) -> Result<Option<PlaceRecord>>;

    /// Every committed row, in ascending id order
    fn scan(&self) -> Result<Vec<PlaceRecord>>;

    /// Number of committed rows
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// An open write transaction
pub trait StoreTransaction {
    /// Insert a row, replacing any row with the same id
    fn upsert(&mut self, record: PlaceRecord) -> Result<()>;

    /// Make every staged row visible atomically
    fn commit(self) -> Result<()>;

    /// Discard every staged row
    fn rollback(self) -> Result<()>;
}
