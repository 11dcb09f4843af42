//! Error types for placetime
//!
//! Provides a unified error type for ingestion, storage and search.

use thiserror::Error;

/// Result type alias using PlaceTimeError
pub type Result<T> = std::result::Result<T, PlaceTimeError>;

/// Unified error type for placetime operations
#[derive(Debug, Error)]
pub enum PlaceTimeError {
    // -------------------------------------------------------------------------
    // Source Errors
    // -------------------------------------------------------------------------
    /// The HTTP request failed or the local path could not be opened
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The fetched bytes are not a readable zip archive
    #[error("Archive format error: {0}")]
    ArchiveFormat(String),

    /// A line has fewer columns than the geonames layout requires
    #[error("Malformed record in {file} line {line}: expected at least {expected} columns, found {found}")]
    MalformedRecord {
        file: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A line is not valid UTF-8
    #[error("Invalid UTF-8 in {file} line {line}")]
    InvalidEncoding { file: String, line: u64 },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Search Errors
    // -------------------------------------------------------------------------
    #[error("Unknown timezone '{0}'")]
    TimezoneResolution(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for PlaceTimeError {
    fn from(e: bincode::Error) -> Self {
        PlaceTimeError::Serialization(e.to_string())
    }
}
