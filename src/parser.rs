//! Geonames line parser
//!
//! The main `geoname` table is tab separated with a fixed column order:
//!
//! ```text
//!  0 geonameid        7 feature code    14 population
//!  1 name             8 country code    15 elevation
//!  2 asciiname        9 cc2             16 dem
//!  3 alternatenames  10 admin1 code     17 timezone
//!  4 latitude        11 admin2 code     18 modification date
//!  5 longitude       12 admin3 code
//!  6 feature class   13 admin4 code
//! ```
//!
//! Only the columns listed in [`GeonamesRawRecord`] are kept.

use std::io;

use crate::error::{PlaceTimeError, Result};
use crate::record::GeonamesRawRecord;

const COL_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_ASCII_NAME: usize = 2;
const COL_ALTERNATE_NAMES: usize = 3;
const COL_LATITUDE: usize = 4;
const COL_LONGITUDE: usize = 5;
const COL_COUNTRY_CODE: usize = 8;
const COL_POPULATION: usize = 14;
const COL_TIMEZONE: usize = 17;

/// Minimum number of columns a line must have (timezone is the last one we read)
pub const MIN_COLUMNS: usize = COL_TIMEZONE + 1;

/// Error detail for a line that is too short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortLine {
    pub found: usize,
}

/// Parse one tab-separated line.
///
/// Fails only when the line has fewer than [`MIN_COLUMNS`] columns.
pub fn parse_line(line: &str) -> std::result::Result<GeonamesRawRecord, ShortLine> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let cols: Vec<&str> = line.split('\t').collect();

    if cols.len() < MIN_COLUMNS {
        return Err(ShortLine { found: cols.len() });
    }

    let alternate_names = if cols[COL_ALTERNATE_NAMES].is_empty() {
        Vec::new()
    } else {
        cols[COL_ALTERNATE_NAMES].split(',').map(str::to_string).collect()
    };

    Ok(GeonamesRawRecord {
        id: cols[COL_ID].to_string(),
        name: cols[COL_NAME].to_string(),
        ascii_name: cols[COL_ASCII_NAME].to_string(),
        alternate_names,
        latitude: cols[COL_LATITUDE].to_string(),
        longitude: cols[COL_LONGITUDE].to_string(),
        country_code: cols[COL_COUNTRY_CODE].to_string(),
        timezone_id: cols[COL_TIMEZONE].to_string(),
        population: parse_population(cols[COL_POPULATION]),
    })
}

/// Parse a population column.
///
/// Empty or non-numeric values read as 0. Values past `u64::MAX` saturate.
pub fn parse_population(raw: &str) -> u64 {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }

    raw.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    })
}

/// Parse a line, attaching file/line context to failures
pub fn parse_record(file: &str, line_no: u64, line: &str) -> Result<GeonamesRawRecord> {
    parse_line(line).map_err(|short| PlaceTimeError::MalformedRecord {
        file: file.to_string(),
        line: line_no,
        expected: MIN_COLUMNS,
        found: short.found,
    })
}

/// Iterator adapter turning a line stream into parsed records.
///
/// Every line is parsed, blank ones included, so an empty line is a
/// [`PlaceTimeError::MalformedRecord`] with one column. Lines that are not
/// valid UTF-8 become [`PlaceTimeError::InvalidEncoding`]. Line numbers are
/// 1-based.
pub struct Records<I> {
    file: String,
    lines: I,
    line_no: u64,
}

impl<I> Records<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(file: impl Into<String>, lines: I) -> Self {
        Self {
            file: file.into(),
            lines,
            line_no: 0,
        }
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

impl<I> Iterator for Records<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<GeonamesRawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_no += 1;

        match line {
            Ok(line) => Some(parse_record(&self.file, self.line_no, &line)),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Some(Err(PlaceTimeError::InvalidEncoding {
                    file: self.file.clone(),
                    line: self.line_no,
                }))
            }
            Err(e) => Some(Err(PlaceTimeError::Io(e))),
        }
    }
}
