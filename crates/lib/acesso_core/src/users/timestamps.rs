//! Legacy timestamp parsing and assertion rendering.
//!
//! Directory imports carry timestamps in several historic string formats.
//! They are tried in order; naive values are taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Naive formats accepted after RFC 3339, in priority order.
const NAIVE_FORMATS: [&str; 3] = [
    // Directory generalized time, e.g. `20181002201900.0Z`.
    "%Y%m%d%H%M%S.0Z",
    // Form input, e.g. `02/10/2018 20:19`.
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Result of parsing a legacy timestamp string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyTimestamp {
    /// No value, or only whitespace.
    Absent,
    Parsed(DateTime<Utc>),
    /// A value was present but matched no known format.
    Unrecognized(String),
}

impl LegacyTimestamp {
    /// Parse a raw value against the accepted formats.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Absent;
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self::Parsed(dt.with_timezone(&Utc));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| Self::Parsed(naive.and_utc()))
            .unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
    }

    /// The parsed value, if any.
    pub fn value(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Parsed(dt) => Some(*dt),
            Self::Absent | Self::Unrecognized(_) => None,
        }
    }
}

/// Parse `raw` for `field`, logging and dropping unrecognized values.
pub fn normalize(field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let parsed = LegacyTimestamp::parse(raw);
    if let LegacyTimestamp::Unrecognized(value) = &parsed {
        warn!(field, value = %value, "unrecognized timestamp format, storing null");
    }
    parsed.value()
}

/// Render a timestamp for an assertion claim.
///
/// Uses `YYYY-MM-DD HH:MM:SS[.ffffff]+00:00`; a missing value renders as
/// the literal `"None"`, which existing relying parties already expect.
pub fn display_timestamp(value: Option<DateTime<Utc>>) -> String {
    let Some(dt) = value else {
        return "None".to_string();
    };
    let micros = dt.timestamp_subsec_micros();
    if micros == 0 {
        format!("{}+00:00", dt.format("%Y-%m-%d %H:%M:%S"))
    } else {
        format!("{}.{micros:06}+00:00", dt.format("%Y-%m-%d %H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn blank_input_is_absent() {
        assert_eq!(LegacyTimestamp::parse(None), LegacyTimestamp::Absent);
        assert_eq!(LegacyTimestamp::parse(Some("   ")), LegacyTimestamp::Absent);
    }

    #[test]
    fn parses_directory_generalized_time() {
        let parsed = LegacyTimestamp::parse(Some("20181002201900.0Z"));
        assert_eq!(parsed, LegacyTimestamp::Parsed(utc(2018, 10, 2, 20, 19, 0)));
    }

    #[test]
    fn parses_day_month_year_minutes() {
        let parsed = LegacyTimestamp::parse(Some("24/12/2018 13:34"));
        assert_eq!(parsed, LegacyTimestamp::Parsed(utc(2018, 12, 24, 13, 34, 0)));
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = LegacyTimestamp::parse(Some("2020-01-01T03:00:00-03:00"));
        assert_eq!(parsed, LegacyTimestamp::Parsed(utc(2020, 1, 1, 6, 0, 0)));
    }

    #[test]
    fn unknown_format_is_tagged_and_normalizes_to_none() {
        let parsed = LegacyTimestamp::parse(Some("yesterday"));
        assert_eq!(parsed, LegacyTimestamp::Unrecognized("yesterday".into()));
        assert_eq!(normalize("created_at", Some("yesterday")), None);
    }

    #[test]
    fn display_matches_assertion_format() {
        assert_eq!(display_timestamp(None), "None");
        assert_eq!(
            display_timestamp(Some(utc(2018, 10, 2, 20, 19, 0))),
            "2018-10-02 20:19:00+00:00"
        );
        let with_micros = utc(2018, 10, 2, 20, 19, 0) + chrono::Duration::microseconds(1500);
        assert_eq!(
            display_timestamp(Some(with_micros)),
            "2018-10-02 20:19:00.001500+00:00"
        );
    }
}
