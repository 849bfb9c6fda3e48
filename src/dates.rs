//! Date parsing shared by page headers and collection date ranges.
//!
//! All dates become unix timestamps (seconds, UTC). Accepted forms:
//!
//! ```text
//! 2020-02-01T10:30:00Z        RFC 3339 (any offset)
//! 2020-02-01 10:30:00         naive date-time, read as UTC
//! 2020-02-01T10:30:00         naive date-time, read as UTC
//! 2020-02-01 10:30            naive date-time without seconds
//! 2020-02-01                  date only, midnight UTC
//! 01-02-2020                  day-month-year, midnight UTC
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unrecognized date: '{0}'")]
pub struct DateError(pub String);

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date string into a unix timestamp.
pub fn parse_timestamp(input: &str) -> Result<i64, DateError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt)
            && let Some(dt) = d.and_hms_opt(0, 0, 0)
        {
            return Ok(dt.and_utc().timestamp());
        }
    }
    Err(DateError(input.to_string()))
}

/// Seconds since the unix epoch for a filesystem time. Pre-epoch times clamp to 0.
pub fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Current time as a unix timestamp.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
