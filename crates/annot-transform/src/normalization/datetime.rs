//! Date and datetime normalization to ISO 8601 text.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a date or datetime and renders it in ISO 8601.
///
/// Values with an offset keep it (`2024-01-15T10:30:00+02:00`), naive
/// datetimes render as `YYYY-MM-DDTHH:MM:SS` and dates as `YYYY-MM-DD`.
pub fn normalize_datetime(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.to_rfc3339());
    }
    if let Some(dt) = try_parse_datetime(trimmed) {
        return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    try_parse_date(trimmed).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Renders a Unix timestamp in seconds as an RFC 3339 UTC datetime.
pub fn from_unix_seconds(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.to_rfc3339())
}

fn try_parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%b-%Y",  // 15-Jan-2024
        "%b %d, %Y", // Jan 15, 2024
        "%d %b %Y",  // 15 Jan 2024
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}
