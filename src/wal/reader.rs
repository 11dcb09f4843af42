//! WAL Reader
//!
//! Handles reading framed entries from the WAL file.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{PlaceTimeError, Result};

use super::entry::{WalEntry, HEADER_SIZE};

/// Upper bound for a single payload; anything larger is treated as garbage
const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last entry that decoded cleanly
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: a complete, checksummed entry
    /// - `Ok(None)`: clean end of file
    /// - `Err(WalCorruption)`: torn write, bad checksum or undecodable payload
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut self.reader, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(PlaceTimeError::WalCorruption(format!(
                "truncated header at offset {}",
                self.position
            )));
        }

        let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap_or_default());
        let crc = u32::from_le_bytes(header[8..12].try_into().unwrap_or_default());
        let len = u32::from_le_bytes(header[12..16].try_into().unwrap_or_default());

        if len > MAX_PAYLOAD_SIZE {
            return Err(PlaceTimeError::WalCorruption(format!(
                "implausible payload length {} at offset {}",
                len, self.position
            )));
        }

        let mut payload = vec![0u8; len as usize];
        if read_full(&mut self.reader, &mut payload)? < payload.len() {
            return Err(PlaceTimeError::WalCorruption(format!(
                "truncated payload at offset {}",
                self.position
            )));
        }

        if crc32fast::hash(&payload) != crc {
            return Err(PlaceTimeError::WalCorruption(format!(
                "checksum mismatch for LSN {} at offset {}",
                lsn, self.position
            )));
        }

        let entry = WalEntry::deserialize(&payload)
            .map_err(|e| PlaceTimeError::WalCorruption(format!("LSN {}: {}", lsn, e)))?;
        if entry.lsn != lsn {
            return Err(PlaceTimeError::WalCorruption(format!(
                "header LSN {} does not match payload LSN {}",
                lsn, entry.lsn
            )));
        }

        self.position += (HEADER_SIZE + payload.len()) as u64;
        Ok(Some(entry))
    }

    /// Offset just past the last valid entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries; stops after the first error
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the file allows; returns bytes read
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
