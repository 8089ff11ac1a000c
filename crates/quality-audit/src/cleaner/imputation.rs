//! Missing value imputation.

use super::CleaningOutcome;
use crate::error::{AuditError, Result, ResultExt};
use crate::table::Table;
use crate::temporal::{millis_to_datetime, timestamp_millis};
use crate::types::ColumnKind;
use crate::utils::{first_mode_index, numeric_values, render_value};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// How to treat missing values in one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImputationStrategy {
    Mean,
    Median,
    /// Most frequent value; ties go to the value seen first.
    Mode,
    /// Remove the rows instead of filling.
    Drop,
}

impl ImputationStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Median => "Median",
            Self::Mode => "Mode",
            Self::Drop => "Drop",
        }
    }

    /// Mean and median need an ordered numeric reading of the column.
    pub fn is_statistic(&self) -> bool {
        matches!(self, Self::Mean | Self::Median)
    }

    /// Fill value over the non-null entries of `values`.
    fn compute(&self, values: &Series) -> Option<f64> {
        match self {
            Self::Mean => values.mean(),
            Self::Median => values.median(),
            Self::Mode | Self::Drop => None,
        }
    }
}

impl fmt::Display for ImputationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImputationStrategy {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "drop" => Ok(Self::Drop),
            other => Err(AuditError::InvalidParameter(format!(
                "unknown imputation strategy '{}' (expected Mean, Median, Mode or Drop)",
                other
            ))),
        }
    }
}

/// Fill or drop the missing values of one column.
///
/// `rows_affected` is the column's missing count before the operation,
/// which is also the null-count delta: no nulls remain after a fill.
/// Mean and median apply to numeric columns (result is `Float64`) and
/// temporal columns (result keeps its dtype); on text or categorical
/// columns they are an [`AuditError::UnsupportedStrategy`]. Text cells of
/// a numeric column that do not parse are filled as well and counted in
/// the detail.
pub fn impute_values(
    table: &Table,
    column: &str,
    strategy: ImputationStrategy,
) -> Result<CleaningOutcome> {
    let series = table.series(column)?;
    let kind = table.kind(column)?;

    if strategy.is_statistic() && !matches!(kind, ColumnKind::Numeric | ColumnKind::Temporal) {
        return Err(AuditError::UnsupportedStrategy {
            column: column.to_string(),
            strategy: strategy.to_string(),
            kind: kind.to_string(),
        });
    }

    let missing = series.null_count();
    if missing == 0 {
        debug!("No missing values in '{}', nothing to impute", column);
        return Ok(CleaningOutcome::unchanged(
            table,
            format!("No missing values in '{}'.", column),
        ));
    }

    info!("Imputing {} missing values in '{}' with {}", missing, column, strategy);

    let outcome = match (strategy, kind) {
        (ImputationStrategy::Drop, _) => {
            let subset = [column.to_string()];
            let df = table.frame().drop_nulls(Some(subset.as_slice()))?;
            CleaningOutcome {
                table: table.derive(df),
                details: format!("Dropped {} rows with missing '{}'.", missing, column),
                rows_affected: missing,
            }
        }
        (ImputationStrategy::Mode, _) => fill_mode(table, series, missing)?,
        (_, ColumnKind::Temporal) => fill_temporal(table, series, strategy, missing)?,
        _ => fill_numeric(table, series, strategy, missing)?,
    };

    Ok(outcome)
}

fn no_values(table: &Table, column: &str, strategy: ImputationStrategy) -> CleaningOutcome {
    CleaningOutcome::unchanged(
        table,
        format!(
            "Cannot impute '{}' with {}: column has no non-null values.",
            column, strategy
        ),
    )
}

fn replace_column(table: &Table, filled: Series) -> Result<Table> {
    let name = filled.name().to_string();
    let mut df = table.frame().clone();
    df.replace(&name, filled)
        .context(format!("Replacing column '{}'", name))?;
    Ok(table.derive(df))
}

fn fill_numeric(
    table: &Table,
    series: &Series,
    strategy: ImputationStrategy,
    missing: usize,
) -> Result<CleaningOutcome> {
    let column = series.name().as_str();
    let Some(values) = numeric_values(series)? else {
        return Ok(no_values(table, column, strategy));
    };
    let coerced = Series::new(series.name().clone(), values.as_slice());
    let Some(fill) = strategy.compute(&coerced) else {
        return Ok(no_values(table, column, strategy));
    };

    let unparsed = coerced.null_count() - missing;
    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();

    let mut details = format!("Imputed missing '{}' with {}: {:.2}", column, strategy, fill);
    if unparsed > 0 {
        details.push_str(&format!(
            ". Caution: {} non-numeric values were also replaced.",
            unparsed
        ));
    }

    Ok(CleaningOutcome {
        table: replace_column(table, Series::new(series.name().clone(), filled))?,
        details,
        rows_affected: missing,
    })
}

fn fill_temporal(
    table: &Table,
    series: &Series,
    strategy: ImputationStrategy,
    missing: usize,
) -> Result<CleaningOutcome> {
    let column = series.name().as_str();

    // Text columns declared temporal: fill with a rendered timestamp
    if matches!(series.dtype(), DataType::String) {
        let millis = timestamp_millis(series)?.unwrap_or_default();
        let Some(fill) = strategy
            .compute(&Series::new(series.name().clone(), millis))
            .and_then(|v| millis_to_datetime(v.round() as i64))
        else {
            return Ok(no_values(table, column, strategy));
        };

        let rendered = fill.format("%Y-%m-%d %H:%M:%S").to_string();
        let filled: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|v| Some(v.map_or_else(|| rendered.clone(), str::to_string)))
            .collect();

        return Ok(CleaningOutcome {
            table: replace_column(table, Series::new(series.name().clone(), filled))?,
            details: format!("Imputed missing '{}' with {}: {}", column, strategy, rendered),
            rows_affected: missing,
        });
    }

    // Date, Datetime and Time: work on the physical integer representation
    let physical = series.to_physical_repr().cast(&DataType::Int64)?;
    let values: Vec<Option<i64>> = physical.i64()?.into_iter().collect();
    let Some(fill) = strategy.compute(&physical).map(|v| v.round() as i64) else {
        return Ok(no_values(table, column, strategy));
    };

    let filled: Vec<Option<i64>> = values.iter().map(|v| Some(v.unwrap_or(fill))).collect();
    let dtype = series.dtype();
    let restored = Series::new(series.name().clone(), filled)
        .cast(&dtype.to_physical())?
        .cast(dtype)?;

    let first_gap = values.iter().position(Option::is_none).unwrap_or(0);
    let shown = render_value(&restored.get(first_gap)?);

    Ok(CleaningOutcome {
        table: replace_column(table, restored)?,
        details: format!("Imputed missing '{}' with {}: {}", column, strategy, shown),
        rows_affected: missing,
    })
}

fn fill_mode(table: &Table, series: &Series, missing: usize) -> Result<CleaningOutcome> {
    let column = series.name().as_str();
    let Some(idx) = first_mode_index(series)? else {
        return Ok(no_values(table, column, ImputationStrategy::Mode));
    };

    let fill = series.new_from_index(idx, series.len());
    let filled = series.zip_with(&series.is_not_null(), &fill)?;
    let shown = render_value(&series.get(idx)?);

    Ok(CleaningOutcome {
        table: replace_column(table, filled)?,
        details: format!("Imputed missing '{}' with Mode: {}", column, shown),
        rows_affected: missing,
    })
}
