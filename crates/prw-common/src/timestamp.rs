//! Timestamp parsing and formatting.
//!
//! The persisted table stores timestamps as `%Y-%m-%d %H:%M:%S` in UTC at
//! seconds resolution. Historical rows contain Unicode hyphen look-alikes
//! (the collector once emitted U+2011 non-breaking hyphens), so parsing
//! normalizes those to ASCII `-` before interpreting the cell.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Format of the `timestamp` column in the persisted table.
pub const TABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the `created:<...` upper bound in count-source queries.
pub const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Replace Unicode hyphen look-alikes with ASCII `-`.
///
/// Covers U+2010 (hyphen), U+2011 (non-breaking hyphen), and U+2212
/// (minus sign).
pub fn normalize_hyphens(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

/// Parse a table timestamp cell into a UTC instant.
pub fn parse_table(raw: &str) -> Result<DateTime<Utc>> {
    let normalized = normalize_hyphens(raw.trim());
    NaiveDateTime::parse_from_str(&normalized, TABLE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Timestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Format a UTC instant as a table timestamp cell.
pub fn format_table(ts: DateTime<Utc>) -> String {
    ts.format(TABLE_FORMAT).to_string()
}

/// Format a UTC instant for a count-source `created:<` bound.
pub fn format_query(ts: DateTime<Utc>) -> String {
    ts.format(QUERY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ascii_timestamp() {
        let ts = parse_table("2025-06-01 12:30:00").unwrap();
        assert_eq!(format_table(ts), "2025-06-01 12:30:00");
        assert_eq!(format_query(ts), "2025-06-01T12:30:00Z");
    }

    #[test]
    fn normalizes_unicode_hyphens() {
        // U+2011 non-breaking hyphen, as found in historical rows.
        let ts = parse_table("2025\u{2011}06\u{2011}01 12:30:00").unwrap();
        assert_eq!(format_table(ts), "2025-06-01 12:30:00");

        assert_eq!(normalize_hyphens("2025\u{2212}01"), "2025-01");
        assert_eq!(normalize_hyphens("plain-ascii"), "plain-ascii");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_table("not a timestamp").unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let ts = parse_table(" 2025-06-01 00:00:00 ").unwrap();
        assert_eq!(format_table(ts), "2025-06-01 00:00:00");
    }
}
