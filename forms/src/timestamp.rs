//! Timestamp parsing and display shared by records, reports and file names.

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod timestamp_test;

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const DISPLAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Shown wherever a timestamp is missing or unparseable.
pub const UNKNOWN: &str = "N/A";

/// Parse an RFC 3339 timestamp, returning `None` for anything else.
#[must_use]
pub fn parse_lenient(raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

/// Human-readable `YYYY-MM-DD HH:MM:SS` rendering, or [`UNKNOWN`].
#[must_use]
pub fn display(ts: Option<OffsetDateTime>) -> String {
    ts.and_then(|ts| ts.format(DISPLAY_FORMAT).ok())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}
