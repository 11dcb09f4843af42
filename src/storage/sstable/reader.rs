//! SSTable Reader
//!
//! Opens table files and provides O(log n) id lookups via in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{PlaceTimeError, Result};
use crate::record::PlaceRecord;

use super::iterator::SSTableIterator;
use super::{le_u32, le_u64, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for table files with in-memory index for O(log n) lookups
pub struct SSTableReader {
    path: PathBuf,
    /// File handle for reading rows
    pub(super) file: BufReader<File>,
    /// In-memory index: id → file offset
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
    /// Index block starting offset (end of data block)
    pub(super) index_offset: u64,
}

impl SSTableReader {
    /// Open a table for reading
    ///
    /// Validates header and footer, checks the data CRC and loads the
    /// index into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let corrupt = |what: String| {
            PlaceTimeError::Store(format!("corrupt table {}: {}", path.display(), what))
        };

        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(corrupt(format!("file too small ({} bytes)", file_size)));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(corrupt(format!("bad magic {:?}", &header[0..4])));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }
        let entry_count = le_u64(&header, 6).unwrap_or_default();

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let index_offset = le_u64(&footer, 0).unwrap_or_default();
        let data_crc = le_u32(&footer, 8).unwrap_or_default();
        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(corrupt(format!("index offset {} out of range", index_offset)));
        }

        // Verify the data block before trusting any offsets in the index
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut hasher = crc32fast::Hasher::new();
        let mut data = (&mut file).take(index_offset - HEADER_SIZE);
        let mut chunk = [0u8; 8192];
        loop {
            let n = data.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
        }
        if hasher.finalize() != data_crc {
            return Err(corrupt("data checksum mismatch".to_string()));
        }

        let index_len = (file_size - FOOTER_SIZE - index_offset) as usize;
        let mut index_data = vec![0u8; index_len];
        file.seek(SeekFrom::Start(index_offset))?;
        file.read_exact(&mut index_data)?;

        // Index entries: [key_len(4)][offset(8)][key]
        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos < index_data.len() {
            let parsed = le_u32(&index_data, pos).and_then(|key_len| {
                let offset = le_u64(&index_data, pos + 4)?;
                let start = pos + 12;
                let key = index_data.get(start..start + key_len as usize)?;
                Some((key.to_vec(), offset, start + key_len as usize))
            });
            let (key, offset, next) =
                parsed.ok_or_else(|| corrupt(format!("truncated index at byte {}", pos)))?;
            index.insert(key, offset);
            pos = next;
        }

        if index.len() as u64 != entry_count {
            return Err(corrupt(format!(
                "header says {} rows, index has {}",
                entry_count,
                index.len()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: BufReader::new(file),
            index,
            entry_count,
            index_offset,
        })
    }

    /// Get a row by id: O(log n) lookup via in-memory index
    pub fn get(&mut self, id: &str) -> Result<Option<PlaceRecord>> {
        let offset = match self.index.get(id.as_bytes()) {
            Some(&off) => off,
            None => return Ok(None),
        };

        self.file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; 8];
        self.file.read_exact(&mut header)?;
        let key_len = le_u32(&header, 0).unwrap_or_default();
        let val_len = le_u32(&header, 4).unwrap_or_default();

        self.file.seek(SeekFrom::Current(i64::from(key_len)))?;

        let mut value = vec![0u8; val_len as usize];
        self.file.read_exact(&mut value)?;

        Ok(Some(bincode::deserialize(&value)?))
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Ids stored in this table, ascending
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.index.keys().map(|k| k.as_slice())
    }

    /// Quick check if an id might be in this table (range check)
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.index.keys().next(), self.index.keys().next_back()) {
            (Some(min), Some(max)) => key >= min.as_slice() && key <= max.as_slice(),
            _ => false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate over every row in id order
    pub fn iter(&mut self) -> Result<SSTableIterator<'_>> {
        SSTableIterator::new(&mut self.file, self.index_offset)
    }
}
