//! Shared utilities for profiling, auditing and cleaning.
//!
//! Numeric coercion, quantiles and first-encountered modes live here so
//! the profiler, the auditor and the cleaning operations agree on the
//! exact same semantics.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date, datetime or time type.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Check if a DataType holds categories (including booleans).
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Categorical(_, _) | DataType::Enum(_, _) | DataType::Boolean
    )
}

// =============================================================================
// Numeric Parsing
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use quality_audit::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("  42%  "), "42");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles currency symbols, percentages and thousands separators.
/// Non-finite results are rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a Series to optional f64 values, one per row.
///
/// Numeric dtypes are cast, strings go through [`parse_numeric_string`].
/// Unparseable cells and NaN become `None`. Returns `Ok(None)` when the
/// dtype has no numeric reading at all.
pub fn numeric_values(series: &Series) -> PolarsResult<Option<Vec<Option<f64>>>> {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) {
        let casted = series.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(Some(values))
    } else if matches!(dtype, DataType::String) {
        let values = series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_string))
            .collect();
        Ok(Some(values))
    } else {
        Ok(None)
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Round to two decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `total`, 0 when `total` is 0.
#[inline]
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Quantile of ascending-sorted values with linear interpolation
/// between closest ranks (`pos = q * (n - 1)`).
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Row index of the first occurrence of the most frequent non-null value.
///
/// Ties resolve to the value encountered first. Values are compared by
/// their string rendering.
pub fn first_mode_index(series: &Series) -> PolarsResult<Option<usize>> {
    let as_str = series.cast(&DataType::String)?;
    let ca = as_str.str()?;

    // value -> (count, first row)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (row, value) in ca.into_iter().enumerate() {
        if let Some(v) = value {
            counts.entry(v).or_insert((0, row)).0 += 1;
        }
    }

    Ok(counts
        .into_values()
        .max_by(|(count_a, row_a), (count_b, row_b)| {
            count_a.cmp(count_b).then(row_b.cmp(row_a))
        })
        .map(|(_, row)| row))
}

/// Render a cell without the quotes polars puts around strings.
pub fn render_value(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
