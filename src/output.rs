//! Result sinks
//!
//! Search output goes through a [`ResultSink`]: either aligned plain text
//! for a terminal, or the JSON item list a launcher's script filter reads.

use std::io::Write;

use serde::Serialize;

use crate::error::{PlaceTimeError, Result};
use crate::search::SearchResult;

/// Icon shown for the launcher error item
pub const ERROR_ICON: &str =
    "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources/AlertStopIcon.icns";

/// Where search results and errors are written
pub trait ResultSink {
    fn error(&mut self, err: &PlaceTimeError) -> Result<()>;
    fn result(&mut self, result: &SearchResult) -> Result<()>;
    /// Emit anything buffered; called once at the end
    fn flush(&mut self) -> Result<()>;
}

/// Push a search outcome through a sink and flush it.
///
/// Returns `false` when the outcome was an error.
pub fn render<K>(sink: &mut K, outcome: Result<Vec<SearchResult>>) -> Result<bool>
where
    K: ResultSink + ?Sized,
{
    let ok = match outcome {
        Ok(results) => {
            for result in &results {
                sink.result(result)?;
            }
            true
        }
        Err(e) => {
            sink.error(&e)?;
            false
        }
    };
    sink.flush()?;
    Ok(ok)
}

// =============================================================================
// Plain text
// =============================================================================

/// One aligned line per result
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for TextSink<W> {
    fn error(&mut self, err: &PlaceTimeError) -> Result<()> {
        writeln!(self.out, "{}", err)?;
        Ok(())
    }

    fn result(&mut self, r: &SearchResult) -> Result<()> {
        let time = r.local_time.format("%-I:%M%P,").to_string();
        let weekday = r.local_time.format("%A").to_string();
        writeln!(
            self.out,
            "{:<25} {:<8} {:<8} · {:<25} · {:<20}",
            r.name, time, weekday, r.country_name, r.timezone
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

// =============================================================================
// Launcher JSON
// =============================================================================

#[derive(Debug, Serialize)]
struct LauncherResponse<'a> {
    items: &'a [LauncherItem],
}

/// One entry in the launcher's result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LauncherItem {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    pub icon: LauncherIcon,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LauncherIcon {
    pub path: String,
}

/// Buffers items and writes them as one JSON document on flush
pub struct LauncherSink<W: Write> {
    out: W,
    items: Vec<LauncherItem>,
}

impl<W: Write> LauncherSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            items: Vec::new(),
        }
    }

    /// Items buffered so far
    pub fn items(&self) -> &[LauncherItem] {
        &self.items
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for LauncherSink<W> {
    fn error(&mut self, err: &PlaceTimeError) -> Result<()> {
        self.items.push(LauncherItem {
            uid: "error".to_string(),
            title: "Error Occurred".to_string(),
            subtitle: err.to_string(),
            arg: None,
            icon: LauncherIcon {
                path: ERROR_ICON.to_string(),
            },
            valid: false,
        });
        Ok(())
    }

    fn result(&mut self, r: &SearchResult) -> Result<()> {
        let title = format!(
            "{}: {}",
            r.description(),
            r.local_time.format("%-I:%M%p, %A")
        );
        self.items.push(LauncherItem {
            uid: r.id.clone(),
            subtitle: r.tz.name().to_string(),
            arg: Some(title.clone()),
            title,
            icon: LauncherIcon {
                path: format!("images/flags-48/{}.png", r.country),
            },
            valid: true,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let response = LauncherResponse { items: &self.items };
        serde_json::to_writer(&mut self.out, &response)
            .map_err(|e| PlaceTimeError::Serialization(e.to_string()))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
