//! IQR outlier detection for numeric columns.

use crate::error::Result;
use crate::table::Table;
use crate::types::ColumnKind;
use crate::utils::{numeric_values, quantile_linear};
use serde::{Deserialize, Serialize};

/// Default multiplier applied to the interquartile range.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Tukey fences computed for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Compute fences from ascending-sorted values.
    pub fn from_sorted(sorted: &[f64], multiplier: f64) -> Option<Self> {
        let q1 = quantile_linear(sorted, 0.25)?;
        let q3 = quantile_linear(sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Strictly outside the fences.
    #[inline]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Outlier count and per-row mask for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSummary {
    pub count: usize,
    /// One entry per row; nulls are never outliers.
    pub mask: Vec<bool>,
    /// `None` for non-numeric columns or columns with no values.
    pub bounds: Option<IqrBounds>,
}

impl OutlierSummary {
    fn none(rows: usize) -> Self {
        Self {
            count: 0,
            mask: vec![false; rows],
            bounds: None,
        }
    }
}

/// Detects outliers with the interquartile-range rule.
pub struct OutlierDetector;

impl OutlierDetector {
    /// Detect outliers in `column` with fences at `multiplier` x IQR.
    ///
    /// Non-numeric columns yield a zero count and an all-false mask.
    /// Numeric columns stored as text are parsed first; unparseable cells
    /// are treated as nulls.
    pub fn detect(table: &Table, column: &str, multiplier: f64) -> Result<OutlierSummary> {
        let series = table.series(column)?;
        let rows = table.height();

        if table.kind(column)? != ColumnKind::Numeric {
            return Ok(OutlierSummary::none(rows));
        }
        let Some(values) = numeric_values(series)? else {
            return Ok(OutlierSummary::none(rows));
        };

        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let Some(bounds) = IqrBounds::from_sorted(&sorted, multiplier) else {
            return Ok(OutlierSummary::none(rows));
        };

        let mask: Vec<bool> = values
            .iter()
            .map(|v| v.is_some_and(|x| bounds.is_outlier(x)))
            .collect();
        let count = mask.iter().filter(|&&m| m).count();

        Ok(OutlierSummary {
            count,
            mask,
            bounds: Some(bounds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use polars::prelude::*;

    #[test]
    fn test_detects_single_high_outlier() {
        let df = df! {
            "v" => [Some(10.0), Some(12.0), None, Some(11.0), Some(13.0), Some(100.0)],
        }
        .unwrap();
        let table = Table::new(df);

        let summary = OutlierDetector::detect(&table, "v", DEFAULT_IQR_MULTIPLIER).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mask, vec![false, false, false, false, false, true]);

        // sorted: 10, 11, 12, 13, 100 -> q1 = 11, q3 = 13
        let bounds = summary.bounds.unwrap();
        assert_eq!(bounds.q1, 11.0);
        assert_eq!(bounds.q3, 13.0);
        assert_eq!(bounds.lower, 8.0);
        assert_eq!(bounds.upper, 16.0);
    }

    #[test]
    fn test_values_on_fence_are_not_outliers() {
        let df = df! { "v" => [1.0, 2.0, 3.0, 4.0, 5.0, 8.0] }.unwrap();
        let table = Table::new(df);
        // q1 = 2.25, q3 = 4.75, upper = 8.5
        let summary = OutlierDetector::detect(&table, "v", 1.5).unwrap();
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn test_non_numeric_column_is_noop() {
        let df = df! { "name" => ["a", "b", "c"] }.unwrap();
        let table = Table::new(df);
        let summary = OutlierDetector::detect(&table, "name", 1.5).unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mask, vec![false; 3]);
        assert!(summary.bounds.is_none());
    }

    #[test]
    fn test_numeric_kind_stored_as_text() {
        let df = df! { "v" => ["1", "2", "3", "4", "oops", "1,000"] }.unwrap();
        let table = Table::with_kinds(df, [("v", ColumnKind::Numeric)]).unwrap();
        let summary = OutlierDetector::detect(&table, "v", 1.5).unwrap();
        assert_eq!(summary.count, 1);
        assert!(summary.mask[5]);
        assert!(!summary.mask[4]);
    }

    #[test]
    fn test_all_null_column() {
        let df = df! { "v" => [None::<f64>, None] }.unwrap();
        let table = Table::new(df);
        let summary = OutlierDetector::detect(&table, "v", 1.5).unwrap();
        assert_eq!(summary.count, 0);
        assert!(summary.bounds.is_none());
    }

    #[test]
    fn test_missing_column_is_error() {
        let table = Table::new(df! { "v" => [1.0] }.unwrap());
        let err = OutlierDetector::detect(&table, "nope", 1.5).unwrap_err();
        assert!(matches!(err, AuditError::ColumnNotFound(_)));
    }
}
