//! Archive sources
//!
//! Resolves a source string to readable, seekable archive bytes.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{PlaceTimeError, Result};

/// Archive bytes, either fully downloaded or backed by a local file
pub enum ArchiveBytes {
    Memory(Cursor<Bytes>),
    File(BufReader<File>),
}

impl Read for ArchiveBytes {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ArchiveBytes::Memory(cursor) => cursor.read(buf),
            ArchiveBytes::File(file) => file.read(buf),
        }
    }
}

impl Seek for ArchiveBytes {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ArchiveBytes::Memory(cursor) => cursor.seek(pos),
            ArchiveBytes::File(file) => file.seek(pos),
        }
    }
}

/// True when the source should be fetched over HTTP
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http")
}

/// Download the whole response body into memory
pub fn fetch(url: &str) -> Result<Bytes> {
    info!(url, "fetching archive");

    let body = reqwest::blocking::get(url)
        .and_then(|res| res.error_for_status())
        .and_then(|res| res.bytes())
        .map_err(|e| PlaceTimeError::Fetch(format!("fetching {} failed: {}", url, e)))?;

    debug!(url, bytes = body.len(), "archive downloaded");
    Ok(body)
}

/// Open a source: URLs are downloaded, everything else is opened as a file
pub fn open_source(source: &str) -> Result<ArchiveBytes> {
    if is_remote(source) {
        return Ok(ArchiveBytes::Memory(Cursor::new(fetch(source)?)));
    }

    let path = Path::new(source);
    let file = File::open(path).map_err(|e| {
        PlaceTimeError::Fetch(format!("cannot open {}: {}", path.display(), e))
    })?;

    debug!(path = %path.display(), "opened local archive");
    Ok(ArchiveBytes::File(BufReader::new(file)))
}
