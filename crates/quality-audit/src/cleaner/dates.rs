//! Date standardization.

use super::CleaningOutcome;
use crate::error::{Result, ResultExt};
use crate::table::Table;
use crate::temporal::{millis_to_series, timestamp_millis};
use crate::types::ColumnKind;
use tracing::{info, warn};

/// Coerce every value of a column to `Datetime(ms)`.
///
/// Unparseable values become null. `rows_affected` is the number of
/// non-null values before the conversion; the detail notes exactly how
/// many of them were coerced to null. The column is marked temporal.
pub fn standardize_dates(table: &Table, column: &str) -> Result<CleaningOutcome> {
    let series = table.series(column)?;
    let rows = series.len();
    let nulls_before = series.null_count();

    let millis = match timestamp_millis(series).context(format!("Reading dates from '{}'", column))? {
        Some(values) => values,
        None => {
            warn!(
                "Column '{}' has dtype {} with no date reading; every value becomes null",
                column,
                series.dtype()
            );
            vec![None; rows]
        }
    };

    let standardized = millis_to_series(series.name().clone(), millis)?;
    let nulls_after = standardized.null_count();

    let mut df = table.frame().clone();
    df.replace(column, standardized)?;

    let mut details = format!("Standardized '{}' to datetime.", column);
    let invalid = nulls_after.saturating_sub(nulls_before);
    if invalid > 0 {
        details.push_str(&format!(
            " Caution: {} invalid date formats were coerced to Null.",
            invalid
        ));
    }

    info!("Standardized '{}' ({} invalid values)", column, invalid);

    Ok(CleaningOutcome {
        table: table.derive_with_kind(df, column, ColumnKind::Temporal),
        details,
        rows_affected: rows - nulls_before,
    })
}
