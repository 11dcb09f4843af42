//! Memory Store
//!
//! Non-durable record store with the same transaction semantics as
//! [`DiskStore`](super::DiskStore). Useful wherever a store has to be
//! injected without touching the filesystem.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::record::PlaceRecord;

use super::{RecordStore, StoreTransaction};

/// In-process place table
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<String, PlaceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    type Txn<'a> = MemoryTransaction<'a>;

    fn begin(&mut self) -> Result<Self::Txn<'_>> {
        Ok(MemoryTransaction {
            store: self,
            staged: BTreeMap::new(),
        })
    }

    fn get(&self, id: &str) -> Result<Option<PlaceRecord>> {
        Ok(self.rows.get(id).cloned())
    }

    fn scan(&self) -> Result<Vec<PlaceRecord>> {
        Ok(self.rows.values().cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.rows.len())
    }
}

/// Write transaction on a [`MemoryStore`]; dropping it discards the staged rows
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    staged: BTreeMap<String, PlaceRecord>,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn upsert(&mut self, record: PlaceRecord) -> Result<()> {
        self.staged.insert(record.id.clone(), record);
        Ok(())
    }

    fn commit(self) -> Result<()> {
        self.store.rows.extend(self.staged);
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        Ok(())
    }
}
