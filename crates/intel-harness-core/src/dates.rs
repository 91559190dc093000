//! Day-granularity date parsing for filter comparison.
//!
//! Stored dates arrive in several shapes (RFC 3339, `+0000` offsets,
//! naive date-times, bare dates). Comparison happens on the calendar day
//! only, so every accepted shape is reduced to a [`NaiveDate`].

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The timezone used to truncate offset-carrying timestamps to a day.
///
/// Naive values (no offset) are taken at face value under either basis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBasis {
    #[default]
    Utc,
    Local,
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses `raw` and truncates it to a calendar day under `basis`.
///
/// Returns `None` for anything that is not a recognizable date.
pub fn parse_day(raw: &str, basis: DateBasis) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate(dt, basis));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(truncate(dt, basis));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn truncate(dt: DateTime<FixedOffset>, basis: DateBasis) -> NaiveDate {
    match basis {
        DateBasis::Utc => dt.with_timezone(&Utc).date_naive(),
        DateBasis::Local => dt.with_timezone(&Local).date_naive(),
    }
}
