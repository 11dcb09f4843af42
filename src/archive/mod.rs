//! Archive Module
//!
//! Turns a zip archive (downloaded or on disk) into a sequence of text
//! files, each exposed as a lazy stream of lines.
//!
//! ## Responsibilities
//! - Classify the source: `http*` is fetched into memory, anything else is a path
//! - Open the bytes as a zip archive
//! - Hand out one contained file at a time as a single-pass line iterator
//!
//! The pipeline only depends on [`LineSource`], so it can be driven by an
//! in-memory fixture as easily as by a real archive.

mod reader;
mod source;

use std::io;

use crate::error::Result;

pub use reader::ArchiveReader;
pub use source::{fetch, is_remote, open_source, ArchiveBytes};

/// A single contained file: its name and a lazy line stream
pub struct SourceFile<'a> {
    name: String,
    lines: Box<dyn Iterator<Item = io::Result<String>> + 'a>,
}

impl<'a> SourceFile<'a> {
    pub fn new<I>(name: impl Into<String>, lines: I) -> Self
    where
        I: Iterator<Item = io::Result<String>> + 'a,
    {
        Self {
            name: name.into(),
            lines: Box::new(lines),
        }
    }

    /// Name of the file inside the archive
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split into name and line stream
    pub fn into_parts(self) -> (String, Box<dyn Iterator<Item = io::Result<String>> + 'a>) {
        (self.name, self.lines)
    }
}

impl Iterator for SourceFile<'_> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

/// Something that yields text files one after another.
///
/// Each returned file borrows the source, so it must be consumed (or dropped)
/// before asking for the next one.
pub trait LineSource {
    /// Next file, or `None` once every file has been handed out
    fn next_file(&mut self) -> Option<Result<SourceFile<'_>>>;
}
