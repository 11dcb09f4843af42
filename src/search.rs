//! Search Engine
//!
//! Scans the store, matches `"<name>, <country>"` against the query terms
//! and attaches the current wall-clock time of each hit.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::country;
use crate::error::{PlaceTimeError, Result};
use crate::matcher::TermMatcher;
use crate::record::PlaceRecord;
use crate::store::RecordStore;

/// A matching place with its resolved timezone and local time
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    /// Country code as stored
    pub country: String,
    /// Country display name
    pub country_name: String,
    /// Timezone name as stored
    pub timezone: String,
    pub tz: Tz,
    /// Local time in `tz` at the moment of the search
    pub local_time: DateTime<Tz>,
}

impl SearchResult {
    /// `"<name>, <country name>"`, the text the terms are matched against
    pub fn description(&self) -> String {
        describe(&self.name, &self.country_name)
    }
}

/// Read-only search over a [`RecordStore`]
pub struct SearchEngine<'s, S: RecordStore> {
    store: &'s S,
}

impl<'s, S: RecordStore> SearchEngine<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Search using the current system time
    pub fn search<T: AsRef<str>>(&self, terms: &[T]) -> Result<Vec<SearchResult>> {
        self.search_at(terms, Utc::now())
    }

    /// Search, computing local times for the instant `now`
    ///
    /// Results come back in store scan order. An unknown timezone on a
    /// matching row aborts the whole search.
    pub fn search_at<T: AsRef<str>>(
        &self,
        terms: &[T],
        now: DateTime<Utc>,
    ) -> Result<Vec<SearchResult>> {
        let matcher = TermMatcher::new(terms);
        let mut results = Vec::new();

        for record in self.store.scan()? {
            let country_name = country::display_name(&record.country);
            if !matcher.matches(&describe(&record.name, &country_name)) {
                continue;
            }

            let tz = resolve_timezone(&record.timezone)?;
            let hit = into_result(record, country_name, tz, now);
            debug!(id = %hit.id, name = %hit.name, timezone = %hit.timezone, "hit");
            results.push(hit);
        }

        debug!(matches = results.len(), "search finished");
        Ok(results)
    }
}

/// Resolve an IANA timezone name; an empty name means UTC
pub fn resolve_timezone(id: &str) -> Result<Tz> {
    if id.is_empty() {
        return Ok(Tz::UTC);
    }
    id.parse::<Tz>()
        .map_err(|_| PlaceTimeError::TimezoneResolution(id.to_string()))
}

fn describe(name: &str, country_name: &str) -> String {
    format!("{}, {}", name, country_name)
}

fn into_result(record: PlaceRecord, country_name: String, tz: Tz, now: DateTime<Utc>) -> SearchResult {
    SearchResult {
        id: record.id,
        name: record.name,
        country: record.country,
        country_name,
        timezone: record.timezone,
        tz,
        local_time: now.with_timezone(&tz),
    }
}
