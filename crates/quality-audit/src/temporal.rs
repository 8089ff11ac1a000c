//! Timestamp coercion shared by the audit engine and date standardization.
//!
//! Every value is reduced to milliseconds since the Unix epoch on a naive
//! (zone-less) clock. Values that cannot be read as a timestamp become
//! `None`; that is never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use crate::utils::is_numeric_dtype;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// The dtype produced by date standardization.
pub const STANDARD_DTYPE: DataType = DataType::Datetime(TimeUnit::Milliseconds, None);

// Cheap pre-screen before trying chrono formats
static TIMESTAMP_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}/\d{1,2}/\d{4}|\d{9,13}(\.\d+)?$)")
        .expect("Invalid regex: timestamp shape")
});

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a single text value as a timestamp.
///
/// Accepts RFC 3339 (converted to UTC), ISO-like and US-style date/time
/// layouts, bare dates (midnight), and epoch seconds or milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() || !TIMESTAMP_SHAPE.is_match(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    s.parse::<f64>()
        .ok()
        .and_then(epoch_to_millis)
        .and_then(millis_to_datetime)
}

/// Read a number as epoch seconds or milliseconds.
///
/// Only values in the seconds range `(1e9, 2e9)` or the milliseconds range
/// `(1e12, 2e12)` (roughly 2001 - 2033) are taken as timestamps.
pub fn epoch_to_millis(value: f64) -> Option<i64> {
    if value > 1e9 && value < 2e9 {
        Some((value * 1000.0).round() as i64)
    } else if value > 1e12 && value < 2e12 {
        Some(value.round() as i64)
    } else {
        None
    }
}

pub fn datetime_to_millis(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

pub fn millis_to_datetime(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// Coerce a Series to epoch milliseconds, one per row.
///
/// Returns `Ok(None)` when the dtype has no timestamp reading at all
/// (booleans, times of day, nested types).
pub fn timestamp_millis(series: &Series) -> PolarsResult<Option<Vec<Option<i64>>>> {
    let values = match series.dtype() {
        DataType::Datetime(unit, _) => {
            let divisor = match unit {
                TimeUnit::Nanoseconds => 1_000_000,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1,
            };
            let physical = series.to_physical_repr();
            physical
                .i64()?
                .into_iter()
                .map(|v| v.map(|x| x.div_euclid(divisor)))
                .collect()
        }
        DataType::Date => {
            let physical = series.to_physical_repr();
            physical
                .i32()?
                .into_iter()
                .map(|v| v.map(|days| days as i64 * MILLIS_PER_DAY))
                .collect()
        }
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_timestamp).map(datetime_to_millis))
            .collect(),
        DataType::Categorical(_, _) | DataType::Enum(_, _) => {
            let as_str = series.cast(&DataType::String)?;
            as_str
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp).map(datetime_to_millis))
                .collect()
        }
        dtype if is_numeric_dtype(dtype) => {
            let casted = series.cast(&DataType::Float64)?;
            casted
                .f64()?
                .into_iter()
                .map(|v| v.and_then(epoch_to_millis))
                .collect()
        }
        _ => return Ok(None),
    };
    Ok(Some(values))
}

/// Build a `Datetime(ms)` Series from epoch milliseconds.
pub fn millis_to_series(name: PlSmallStr, values: Vec<Option<i64>>) -> PolarsResult<Series> {
    Series::new(name, values).cast(&STANDARD_DTYPE)
}
