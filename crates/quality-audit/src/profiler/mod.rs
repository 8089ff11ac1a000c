//! Column profiling for tables.
//!
//! This module provides:
//! - Per-column missing, distinct and outlier statistics with a status band
//! - IQR outlier detection ([`OutlierDetector`])
//! - A data dictionary with one example value per column

mod outliers;

pub use outliers::{DEFAULT_IQR_MULTIPLIER, IqrBounds, OutlierDetector, OutlierSummary};

use crate::config::AuditConfig;
use crate::error::Result;
use crate::table::Table;
use crate::types::{ColumnKind, ColumnProfile, ColumnStatus, DictionaryEntry};
use crate::utils::{percentage, render_value, round2};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Column profiler for per-column diagnostics.
pub struct ColumnProfiler;

impl ColumnProfiler {
    /// Profile every column, in table order.
    ///
    /// Columns are profiled on the rayon pool when
    /// `config.parallel_profiling` is set; the output order is the table
    /// order either way.
    pub fn profile_table(table: &Table, config: &AuditConfig) -> Vec<ColumnProfile> {
        let columns: Vec<(&str, ColumnKind)> = table.kinds().collect();
        debug!(
            "Profiling {} columns ({})",
            columns.len(),
            if config.parallel_profiling { "parallel" } else { "sequential" }
        );

        let profile = |(name, kind): &(&str, ColumnKind)| -> Option<ColumnProfile> {
            let series = table.series(name).ok()?;
            Some(Self::profile_series(table, series, *kind, config))
        };

        if config.parallel_profiling {
            columns.par_iter().filter_map(profile).collect()
        } else {
            columns.iter().filter_map(profile).collect()
        }
    }

    /// Profile a single column.
    pub fn profile_column(
        table: &Table,
        column: &str,
        config: &AuditConfig,
    ) -> Result<ColumnProfile> {
        let series = table.series(column)?;
        let kind = table.kind(column)?;
        Ok(Self::profile_series(table, series, kind, config))
    }

    /// One entry per column with its dtype, non-null count and the first
    /// non-null value.
    pub fn data_dictionary(table: &Table) -> Vec<DictionaryEntry> {
        table
            .kinds()
            .filter_map(|(name, kind)| {
                let series = table.series(name).ok()?;
                let non_null = series.drop_nulls();
                let example_value = if non_null.is_empty() {
                    None
                } else {
                    non_null.get(0).ok().map(|v| render_value(&v))
                };
                Some(DictionaryEntry {
                    name: name.to_string(),
                    kind,
                    dtype: series.dtype().to_string(),
                    non_null_count: non_null.len(),
                    example_value,
                })
            })
            .collect()
    }

    fn profile_series(
        table: &Table,
        series: &Series,
        kind: ColumnKind,
        config: &AuditConfig,
    ) -> ColumnProfile {
        let name = series.name().to_string();
        let missing_count = series.null_count();
        let missing_pct = percentage(missing_count, series.len());

        let distinct_count = match series.drop_nulls().n_unique() {
            Ok(n) => n,
            Err(e) => {
                warn!("Could not count distinct values in '{}': {}", name, e);
                0
            }
        };

        let outlier_count = if kind == ColumnKind::Numeric {
            match OutlierDetector::detect(table, &name, config.iqr_multiplier) {
                Ok(summary) => summary.count,
                Err(e) => {
                    warn!("Outlier detection failed for '{}': {}", name, e);
                    0
                }
            }
        } else {
            0
        };

        ColumnProfile {
            status: ColumnStatus::from_missing_pct(missing_pct, config.critical_missing_pct),
            kind,
            dtype: series.dtype().to_string(),
            missing_count,
            missing_percentage: round2(missing_pct),
            distinct_count,
            outlier_count,
            name,
        }
    }
}
