//! Cleaning operations for tables.
//!
//! This module provides:
//! - Missing value imputation (mean, median, mode, drop)
//! - Date standardization to `Datetime(ms)`
//! - Duplicate row removal
//! - Dropping rows with missing values
//!
//! Every operation takes a [`Table`] by reference and returns a new one in
//! a [`CleaningOutcome`]. None of them mutates its input or records
//! history; that is the caller's job (see [`crate::session::WorkingSet`]).

mod dates;
mod imputation;
mod rows;

pub use dates::standardize_dates;
pub use imputation::{ImputationStrategy, impute_values};
pub use rows::{drop_missing_values, remove_duplicates};

use crate::error::{AuditError, Result};
use crate::table::Table;
use crate::types::OperationKind;
use std::fmt;
use std::str::FromStr;

/// Result of one cleaning operation.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: Table,
    /// Human-readable summary of what changed.
    pub details: String,
    /// Exact row-count or null-count delta produced.
    pub rows_affected: usize,
}

impl CleaningOutcome {
    pub(crate) fn unchanged(table: &Table, details: impl Into<String>) -> Self {
        Self {
            table: table.clone(),
            details: details.into(),
            rows_affected: 0,
        }
    }
}

/// A cleaning step the caller can store, parse and replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleaningOperation {
    Impute {
        column: String,
        strategy: ImputationStrategy,
    },
    StandardizeDates {
        column: String,
    },
    /// `None` compares whole rows.
    RemoveDuplicates {
        subset: Option<Vec<String>>,
    },
    /// `None` checks every column.
    DropMissing {
        columns: Option<Vec<String>>,
    },
}

impl CleaningOperation {
    /// Run the operation against a table.
    pub fn apply(&self, table: &Table) -> Result<CleaningOutcome> {
        match self {
            Self::Impute { column, strategy } => impute_values(table, column, *strategy),
            Self::StandardizeDates { column } => standardize_dates(table, column),
            Self::RemoveDuplicates { subset } => remove_duplicates(table, subset.as_deref()),
            Self::DropMissing { columns } => drop_missing_values(table, columns.as_deref()),
        }
    }

    /// The history category this operation is logged under.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Impute { .. } => OperationKind::Imputation,
            Self::StandardizeDates { .. } => OperationKind::Standardization,
            Self::RemoveDuplicates { .. } => OperationKind::RemoveDuplicates,
            Self::DropMissing { .. } => OperationKind::DropMissing,
        }
    }
}

fn parse_column_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect()
    })
}

/// Parses `impute:COL:STRATEGY`, `dates:COL`, `dedupe[:A,B]` and
/// `dropna[:A,B]`.
impl FromStr for CleaningOperation {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        let (op, rest) = match s.split_once(':') {
            Some((op, rest)) => (op, Some(rest)),
            None => (s, None),
        };

        match (op.trim().to_ascii_lowercase().as_str(), rest) {
            ("impute", Some(rest)) => {
                let (column, strategy) = rest.rsplit_once(':').ok_or_else(|| {
                    AuditError::InvalidParameter(format!(
                        "expected impute:COLUMN:STRATEGY, got '{}'",
                        s
                    ))
                })?;
                Ok(Self::Impute {
                    column: column.to_string(),
                    strategy: strategy.parse()?,
                })
            }
            ("dates", Some(column)) if !column.is_empty() => Ok(Self::StandardizeDates {
                column: column.to_string(),
            }),
            ("dedupe", rest) => Ok(Self::RemoveDuplicates {
                subset: parse_column_list(rest),
            }),
            ("dropna", rest) => Ok(Self::DropMissing {
                columns: parse_column_list(rest),
            }),
            _ => Err(AuditError::InvalidParameter(format!(
                "unknown cleaning operation '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for CleaningOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Impute { column, strategy } => write!(f, "impute:{}:{}", column, strategy),
            Self::StandardizeDates { column } => write!(f, "dates:{}", column),
            Self::RemoveDuplicates { subset: None } => write!(f, "dedupe"),
            Self::RemoveDuplicates { subset: Some(cols) } => write!(f, "dedupe:{}", cols.join(",")),
            Self::DropMissing { columns: None } => write!(f, "dropna"),
            Self::DropMissing { columns: Some(cols) } => write!(f, "dropna:{}", cols.join(",")),
        }
    }
}
