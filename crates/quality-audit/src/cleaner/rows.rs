//! Row-removing operations: duplicates and missing values.

use super::CleaningOutcome;
use crate::error::{AuditError, Result};
use crate::table::Table;
use polars::prelude::*;
use tracing::{debug, info};

fn all_columns(table: &Table) -> Vec<String> {
    table.column_names().into_iter().map(String::from).collect()
}

/// Remove rows whose key tuple already appeared earlier.
///
/// Keys are the `subset` columns, or whole rows when `None`. Nulls compare
/// equal to each other. The first occurrence is kept and row order is
/// preserved. An empty subset is an [`AuditError::InvalidParameter`].
pub fn remove_duplicates(table: &Table, subset: Option<&[String]>) -> Result<CleaningOutcome> {
    match subset {
        Some([]) => {
            return Err(AuditError::InvalidParameter(
                "duplicate subset must name at least one column".to_string(),
            ));
        }
        Some(columns) => table.require_columns(columns)?,
        None => {}
    }

    let df = table
        .frame()
        .unique_stable(subset, UniqueKeepStrategy::First, None)?;
    let removed = table.height() - df.height();

    let basis = match subset {
        Some(columns) => format!("[{}]", columns.join(", ")),
        None => "all columns".to_string(),
    };
    if removed > 0 {
        info!("Removed {} duplicate rows based on {}", removed, basis);
    } else {
        debug!("No duplicate rows based on {}", basis);
    }

    Ok(CleaningOutcome {
        table: table.derive(df),
        details: format!("Removed {} duplicates based on {}", removed, basis),
        rows_affected: removed,
    })
}

/// Remove rows with a null in any of `columns` (every column when `None`
/// or empty).
pub fn drop_missing_values(table: &Table, columns: Option<&[String]>) -> Result<CleaningOutcome> {
    let columns = match columns {
        Some(columns) if !columns.is_empty() => {
            table.require_columns(columns)?;
            columns.to_vec()
        }
        _ => all_columns(table),
    };

    let df = table.frame().drop_nulls(Some(columns.as_slice()))?;
    let dropped = table.height() - df.height();
    debug!("Dropped {} rows with nulls in {:?}", dropped, columns);

    Ok(CleaningOutcome {
        table: table.derive(df),
        details: format!("Dropped {} rows with nulls.", dropped),
        rows_affected: dropped,
    })
}
