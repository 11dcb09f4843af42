//! Tests for the MemTable, table files and the storage manager
//!
//! These tests verify:
//! - MemTable replace semantics and ordering
//! - Table creation, O(log n) lookups and iteration
//! - Corruption detection on open
//! - Newest table wins, compaction merges everything into one file

mod common;

use std::fs;
use std::path::PathBuf;

use common::place;
use placetime::memtable::MemTable;
use placetime::record::PlaceRecord;
use placetime::storage::{SSTable, SSTableBuilder, SSTableReader, StorageManager};
use placetime::PlaceTimeError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_sstable() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.sst");
    (temp_dir, path)
}

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sstables");
    (temp_dir, path)
}

fn row(i: usize) -> PlaceRecord {
    place(
        &format!("{:05}", i),
        &format!("Place {}", i),
        "DE",
        "Europe/Berlin",
        i as u64 * 1000,
    )
}

/// Create a table with zero-padded ids so they sort numerically
fn create_sstable_with_rows(path: &PathBuf, count: usize) -> SSTable {
    let mut builder = SSTableBuilder::new(path).unwrap();
    for i in 0..count {
        builder.add(&row(i)).unwrap();
    }
    builder.finish().unwrap()
}

fn memtable_of(records: Vec<PlaceRecord>) -> MemTable {
    let mut memtable = MemTable::new();
    for record in records {
        memtable.put(record);
    }
    memtable
}

// =============================================================================
// MemTable Tests
// =============================================================================

#[test]
fn test_memtable_put_and_get() {
    let mut memtable = MemTable::new();
    assert!(memtable.is_empty());

    memtable.put(row(1));

    assert_eq!(memtable.get("00001"), Some(&row(1)));
    assert_eq!(memtable.get("00002"), None);
    assert_eq!(memtable.entry_count(), 1);
}

#[test]
fn test_memtable_replace_keeps_one_row() {
    let mut memtable = MemTable::new();
    memtable.put(place("1", "Old", "DE", "Europe/Berlin", 1));
    let size_before = memtable.size();

    memtable.put(place("1", "New", "DE", "Europe/Berlin", 2));

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get("1").unwrap().name, "New");
    assert_eq!(memtable.size(), size_before);
}

#[test]
fn test_memtable_iterates_in_id_order() {
    let memtable = memtable_of(vec![row(3), row(1), row(2)]);

    let ids: Vec<_> = memtable.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids, vec!["00001", "00002", "00003"]);
}

#[test]
fn test_memtable_clear() {
    let mut memtable = memtable_of(vec![row(1), row(2)]);

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
}

// =============================================================================
// SSTable Tests
// =============================================================================

#[test]
fn test_builder_creates_file() {
    let (_temp, path) = setup_temp_sstable();

    let sstable = create_sstable_with_rows(&path, 5);

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());
    assert_eq!(sstable.entry_count(), 5);
    assert_eq!(sstable.min_key, b"00000");
    assert_eq!(sstable.max_key, b"00004");
    assert_eq!(sstable.file_size, fs::metadata(&path).unwrap().len());
}

#[test]
fn test_builder_rejects_out_of_order_rows() {
    let (_temp, path) = setup_temp_sstable();
    let mut builder = SSTableBuilder::new(&path).unwrap();
    builder.add(&row(2)).unwrap();

    assert!(matches!(builder.add(&row(1)), Err(PlaceTimeError::Store(_))));
    assert!(matches!(builder.add(&row(2)), Err(PlaceTimeError::Store(_))));
}

#[test]
fn test_empty_sstable_round_trip() {
    let (_temp, path) = setup_temp_sstable();
    SSTableBuilder::new(&path).unwrap().finish().unwrap();

    let mut reader = SSTableReader::open(&path).unwrap();

    assert_eq!(reader.entry_count(), 0);
    assert_eq!(reader.get("anything").unwrap(), None);
    assert_eq!(reader.iter().unwrap().count(), 0);
}

#[test]
fn test_reader_get() {
    let (_temp, path) = setup_temp_sstable();
    create_sstable_with_rows(&path, 100);

    let mut reader = SSTableReader::open(&path).unwrap();

    assert_eq!(reader.entry_count(), 100);
    assert_eq!(reader.get("00042").unwrap(), Some(row(42)));
    assert_eq!(reader.get("00000").unwrap(), Some(row(0)));
    assert_eq!(reader.get("00099").unwrap(), Some(row(99)));
    assert_eq!(reader.get("00100").unwrap(), None);
    assert!(reader.might_contain(b"00050"));
    assert!(!reader.might_contain(b"99999"));
}

#[test]
fn test_reader_iterates_in_order() {
    let (_temp, path) = setup_temp_sstable();
    create_sstable_with_rows(&path, 10);
    let mut reader = SSTableReader::open(&path).unwrap();

    let rows: Vec<PlaceRecord> = reader.iter().unwrap().map(|r| r.unwrap()).collect();

    assert_eq!(rows, (0..10).map(row).collect::<Vec<_>>());
}

#[test]
fn test_reader_get_after_iter() {
    let (_temp, path) = setup_temp_sstable();
    create_sstable_with_rows(&path, 10);
    let mut reader = SSTableReader::open(&path).unwrap();

    assert_eq!(reader.iter().unwrap().count(), 10);

    assert_eq!(reader.get("00003").unwrap(), Some(row(3)));
}

#[test]
fn test_reader_detects_data_corruption() {
    let (_temp, path) = setup_temp_sstable();
    create_sstable_with_rows(&path, 3);
    let mut bytes = fs::read(&path).unwrap();
    bytes[20] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path), Err(PlaceTimeError::Store(_))));
}

#[test]
fn test_reader_rejects_bad_magic() {
    let (_temp, path) = setup_temp_sstable();
    create_sstable_with_rows(&path, 3);
    let mut bytes = fs::read(&path).unwrap();
    bytes[0..4].copy_from_slice(b"NOPE");
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path), Err(PlaceTimeError::Store(_))));
}

#[test]
fn test_reader_rejects_tiny_file() {
    let (_temp, path) = setup_temp_sstable();
    fs::write(&path, b"PLTZ").unwrap();

    assert!(SSTableReader::open(&path).is_err());
}

// =============================================================================
// StorageManager Tests
// =============================================================================

#[test]
fn test_manager_open_empty() {
    let (_temp, dir) = setup_temp_storage();

    let manager = StorageManager::open(&dir).unwrap();

    assert!(dir.exists());
    assert_eq!(manager.sstable_count(), 0);
    assert!(manager.is_empty());
    assert_eq!(manager.next_sstable_id(), 1);
}

#[test]
fn test_manager_flush_and_get() {
    let (_temp, dir) = setup_temp_storage();
    let manager = StorageManager::open(&dir).unwrap();

    let sstable = manager.flush(&memtable_of(vec![row(1), row(2)])).unwrap();

    assert_eq!(sstable.entry_count(), 2);
    assert_eq!(manager.sstable_count(), 1);
    assert_eq!(manager.get("00001").unwrap(), Some(row(1)));
    assert_eq!(manager.get("00003").unwrap(), None);
    assert_eq!(manager.len(), 2);
}

#[test]
fn test_manager_rejects_empty_flush() {
    let (_temp, dir) = setup_temp_storage();
    let manager = StorageManager::open(&dir).unwrap();

    assert!(manager.flush(&MemTable::new()).is_err());
}

#[test]
fn test_manager_newest_table_wins() {
    let (_temp, dir) = setup_temp_storage();
    let manager = StorageManager::open(&dir).unwrap();
    manager
        .flush(&memtable_of(vec![place("1", "Old", "DE", "Europe/Berlin", 1), row(2)]))
        .unwrap();
    manager
        .flush(&memtable_of(vec![place("1", "New", "DE", "Europe/Berlin", 1)]))
        .unwrap();

    assert_eq!(manager.get("1").unwrap().unwrap().name, "New");
    let scanned = manager.scan().unwrap();
    assert_eq!(scanned.len(), 2);
    assert_eq!(scanned[0].id, "00002");
    assert_eq!(scanned[1].name, "New");
    assert_eq!(manager.len(), 2);
}

#[test]
fn test_manager_reopen_loads_tables() {
    let (_temp, dir) = setup_temp_storage();
    {
        let manager = StorageManager::open(&dir).unwrap();
        manager.flush(&memtable_of(vec![row(1)])).unwrap();
        manager.flush(&memtable_of(vec![row(2)])).unwrap();
    }

    let manager = StorageManager::open(&dir).unwrap();

    assert_eq!(manager.sstable_count(), 2);
    assert_eq!(manager.next_sstable_id(), 3);
    assert_eq!(manager.scan().unwrap(), vec![row(1), row(2)]);
}

#[test]
fn test_manager_removes_unfinished_tables() {
    let (_temp, dir) = setup_temp_storage();
    fs::create_dir_all(&dir).unwrap();
    let leftover = dir.join("sstable_000009.tmp");
    fs::write(&leftover, b"partial").unwrap();
    fs::write(dir.join("notes.txt"), b"ignored").unwrap();

    let manager = StorageManager::open(&dir).unwrap();

    assert!(!leftover.exists());
    assert_eq!(manager.sstable_count(), 0);
}

#[test]
fn test_manager_read_only_leaves_directory_alone() {
    let (_temp, dir) = setup_temp_storage();

    let manager = StorageManager::open_read_only(&dir).unwrap();

    assert!(!dir.exists());
    assert!(manager.is_empty());
    assert!(manager.scan().unwrap().is_empty());
}

#[test]
fn test_manager_compact() {
    let (_temp, dir) = setup_temp_storage();
    let manager = StorageManager::open(&dir).unwrap();
    manager.flush(&memtable_of(vec![row(1), row(2)])).unwrap();
    manager.flush(&memtable_of(vec![row(3)])).unwrap();
    manager
        .flush(&memtable_of(vec![place("00001", "Renamed", "DE", "Europe/Berlin", 5)]))
        .unwrap();

    let merged = manager.compact().unwrap().unwrap();

    assert_eq!(merged.entry_count(), 3);
    assert_eq!(manager.sstable_count(), 1);
    assert_eq!(manager.get("00001").unwrap().unwrap().name, "Renamed");
    let files = fs::read_dir(&dir).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn test_manager_compact_single_table_is_noop() {
    let (_temp, dir) = setup_temp_storage();
    let manager = StorageManager::open(&dir).unwrap();
    manager.flush(&memtable_of(vec![row(1)])).unwrap();

    assert!(manager.compact().unwrap().is_none());
    assert_eq!(manager.sstable_count(), 1);
}
