//! Archive Reader
//!
//! Wraps a zip archive and hands out its files as line streams.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Seek};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{PlaceTimeError, Result};

use super::source::{open_source, ArchiveBytes};
use super::{LineSource, SourceFile};

/// Reader over the text files of one zip archive
pub struct ArchiveReader<R: Read + Seek> {
    /// Where the archive came from (for logs and errors)
    origin: String,
    zip: ZipArchive<R>,
    /// Remaining (index, name) pairs, directories excluded
    pending: VecDeque<(usize, String)>,
}

impl ArchiveReader<ArchiveBytes> {
    /// Open the archive at a URL or filesystem path
    pub fn open(source: &str) -> Result<Self> {
        let bytes = open_source(source)?;
        Self::new(source, bytes)
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Open a zip archive from any seekable reader
    pub fn new(origin: impl Into<String>, reader: R) -> Result<Self> {
        let origin = origin.into();
        let mut zip = ZipArchive::new(reader).map_err(|e| {
            PlaceTimeError::ArchiveFormat(format!("{} is not a valid zip archive: {}", origin, e))
        })?;

        let mut pending = VecDeque::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip.by_index(index).map_err(|e| {
                PlaceTimeError::ArchiveFormat(format!("{}: entry {}: {}", origin, index, e))
            })?;
            if !file.is_dir() {
                pending.push_back((index, file.name().to_string()));
            }
        }

        debug!(origin = %origin, files = pending.len(), "archive opened");

        Ok(Self { origin, zip, pending })
    }

    /// Where this archive was read from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Names of the files not yet handed out
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|(_, name)| name.as_str())
    }
}

impl<R: Read + Seek> LineSource for ArchiveReader<R> {
    fn next_file(&mut self) -> Option<Result<SourceFile<'_>>> {
        let (index, name) = self.pending.pop_front()?;

        debug!(origin = %self.origin, file = %name, "reading archive entry");

        let origin = &self.origin;
        let file = match self.zip.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                return Some(Err(PlaceTimeError::ArchiveFormat(format!(
                    "{}: {}: {}",
                    origin, name, e
                ))))
            }
        };

        Some(Ok(SourceFile::new(name, BufReader::new(file).lines())))
    }
}
