//! MemTable implementation
//!
//! BTreeMap-based staging table.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::record::PlaceRecord;

/// Sorted in-memory rows, keyed by id
#[derive(Debug, Default)]
pub struct MemTable {
    data: BTreeMap<String, PlaceRecord>,
    /// Approximate size in bytes of all staged rows
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row; returns the new approximate size
    pub fn put(&mut self, record: PlaceRecord) -> usize {
        let added = Self::approx_size(&record);
        if let Some(old) = self.data.insert(record.id.clone(), record) {
            self.size -= Self::approx_size(&old);
        }
        self.size += added;
        self.size
    }

    /// Get a staged row by id
    pub fn get(&self, id: &str) -> Option<&PlaceRecord> {
        self.data.get(id)
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rows in ascending id order
    pub fn iter(&self) -> btree_map::Values<'_, String, PlaceRecord> {
        self.data.values()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.data.clear();
        self.size = 0;
    }

    fn approx_size(record: &PlaceRecord) -> usize {
        record.id.len()
            + record.name.len()
            + record.country.len()
            + record.timezone.len()
            + std::mem::size_of::<u64>()
    }
}
