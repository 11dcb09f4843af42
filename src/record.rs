//! Place records
//!
//! `GeonamesRawRecord` is the column subset pulled out of one dump line;
//! `PlaceRecord` is the row that survives into the store.

use serde::{Deserialize, Serialize};

/// One row of the place table, keyed by `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Geonames id (stable external identifier)
    pub id: String,

    /// Display name
    pub name: String,

    /// ISO-3166 alpha-2 country code
    pub country: String,

    /// IANA timezone name, e.g. `Europe/Berlin`
    pub timezone: String,

    /// Population, saturated to `u64::MAX`
    pub population: u64,
}

impl PlaceRecord {
    /// Store key for this record
    pub fn key(&self) -> &[u8] {
        self.id.as_bytes()
    }
}

/// Untransformed columns of a single geonames line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeonamesRawRecord {
    pub id: String,
    pub name: String,
    pub ascii_name: String,
    pub alternate_names: Vec<String>,
    pub latitude: String,
    pub longitude: String,
    pub country_code: String,
    pub timezone_id: String,
    pub population: u64,
}

impl GeonamesRawRecord {
    /// Convert into a storable row.
    ///
    /// The ASCII name is preferred so that plain-keyboard queries match;
    /// the UTF-8 name is used when the ASCII column is empty.
    pub fn into_place(self) -> PlaceRecord {
        let name = if self.ascii_name.is_empty() {
            self.name
        } else {
            self.ascii_name
        };

        PlaceRecord {
            id: self.id,
            name,
            country: self.country_code,
            timezone: self.timezone_id,
            population: self.population,
        }
    }
}
