//! SSTable Iterator
//!
//! Sequential iteration over all rows in a table file.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::error::Result;
use crate::record::PlaceRecord;

use super::{le_u32, HEADER_SIZE};

/// Iterator over table rows in ascending id order
pub struct SSTableIterator<'a> {
    file: &'a mut BufReader<File>,
    /// Stop reading when we reach this offset (start of index block)
    end_offset: u64,
    current_offset: u64,
}

impl<'a> SSTableIterator<'a> {
    pub(super) fn new(file: &'a mut BufReader<File>, end_offset: u64) -> Result<Self> {
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        Ok(Self {
            file,
            end_offset,
            current_offset: HEADER_SIZE,
        })
    }

    fn read_row(&mut self) -> Result<PlaceRecord> {
        let mut header = [0u8; 8];
        self.file.read_exact(&mut header)?;
        let key_len = le_u32(&header, 0).unwrap_or_default() as usize;
        let val_len = le_u32(&header, 4).unwrap_or_default() as usize;

        // The id is repeated inside the record
        let mut buf = vec![0u8; key_len + val_len];
        self.file.read_exact(&mut buf)?;
        self.current_offset += (8 + key_len + val_len) as u64;

        Ok(bincode::deserialize(&buf[key_len..])?)
    }
}

impl Iterator for SSTableIterator<'_> {
    type Item = Result<PlaceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_offset >= self.end_offset {
            return None;
        }

        let row = self.read_row();
        if row.is_err() {
            // Stop after the first error rather than reading garbage
            self.current_offset = self.end_offset;
        }
        Some(row)
    }
}
