//! The in-memory table audited and cleaned by this crate.
//!
//! A [`Table`] is a polars [`DataFrame`] paired with one [`ColumnKind`] per
//! column. Kinds are decided once at construction, either inferred from the
//! dtypes or declared by the caller, and carried forward by name through
//! every cleaning operation.

use crate::error::{AuditError, Result};
use crate::types::ColumnKind;
use crate::utils::{is_categorical_dtype, is_numeric_dtype, is_temporal_dtype};
use polars::prelude::*;
use std::collections::HashMap;

/// A DataFrame with per-column semantic kinds.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
    kinds: Vec<ColumnKind>,
}

impl Table {
    /// Wrap a DataFrame, inferring every column kind from its dtype.
    pub fn new(df: DataFrame) -> Self {
        let kinds = df.dtypes().iter().map(infer_kind).collect();
        Self { df, kinds }
    }

    /// Wrap a DataFrame with caller-declared kinds for some columns.
    ///
    /// Columns not named in `overrides` are inferred. Naming an absent
    /// column is a [`AuditError::ColumnNotFound`]; declaring a kind the
    /// column's dtype cannot carry is an [`AuditError::InvalidParameter`].
    pub fn with_kinds<I, S>(df: DataFrame, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnKind)>,
        S: AsRef<str>,
    {
        let mut table = Self::new(df);
        for (name, kind) in overrides {
            let name = name.as_ref();
            let idx = table.index_of(name)?;
            let dtype = table.df.get_columns()[idx].dtype();
            if !kind_accepts(kind, dtype) {
                return Err(AuditError::InvalidParameter(format!(
                    "column '{}' with dtype {} cannot be declared {}",
                    name, dtype, kind
                )));
            }
            table.kinds[idx] = kind;
        }
        Ok(table)
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::new(DataFrame::empty())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Kind of the named column.
    pub fn kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(self.kinds[self.index_of(name)?])
    }

    /// Column names paired with their kinds, in table order.
    pub fn kinds(&self) -> impl Iterator<Item = (&str, ColumnKind)> + '_ {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().as_str())
            .zip(self.kinds.iter().copied())
    }

    /// Borrow the named column as a Series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        let idx = self.index_of(name)?;
        Ok(self.df.get_columns()[idx].as_materialized_series())
    }

    /// Fail with `ColumnNotFound` for the first absent name.
    pub fn require_columns(&self, names: &[String]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n)) {
            Some(missing) => Err(AuditError::ColumnNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    /// Build a table from a derived DataFrame, keeping kinds by name.
    ///
    /// A column whose new dtype no longer fits its previous kind is
    /// re-inferred, as is any column this table did not have.
    pub(crate) fn derive(&self, df: DataFrame) -> Self {
        let previous: HashMap<&str, ColumnKind> = self.kinds().collect();
        let kinds = df
            .get_columns()
            .iter()
            .map(|c| match previous.get(c.name().as_str()) {
                Some(&kind) if kind_accepts(kind, c.dtype()) => kind,
                _ => infer_kind(c.dtype()),
            })
            .collect();
        Self { df, kinds }
    }

    /// Like [`Table::derive`], then force one column to a kind.
    pub(crate) fn derive_with_kind(&self, df: DataFrame, column: &str, kind: ColumnKind) -> Self {
        let mut table = self.derive(df);
        if let Some(idx) = table.df.get_column_index(column) {
            table.kinds[idx] = kind;
        }
        table
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.df
            .get_column_index(name)
            .ok_or_else(|| AuditError::ColumnNotFound(name.to_string()))
    }
}

impl From<DataFrame> for Table {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}

/// Infer a column kind from its dtype.
pub fn infer_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_temporal_dtype(dtype) {
        ColumnKind::Temporal
    } else if is_categorical_dtype(dtype) {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}

/// Whether a column of `dtype` can carry `kind`. Raw text can carry any kind.
fn kind_accepts(kind: ColumnKind, dtype: &DataType) -> bool {
    let is_text = matches!(dtype, DataType::String);
    match kind {
        ColumnKind::Numeric => is_numeric_dtype(dtype) || is_text,
        ColumnKind::Temporal => is_temporal_dtype(dtype) || is_text,
        ColumnKind::Categorical => is_categorical_dtype(dtype) || is_text,
        ColumnKind::Text => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df! {
            "id" => [1i64, 2, 3],
            "score" => [1.5, 2.5, 3.5],
            "name" => ["a", "b", "c"],
            "flag" => [true, false, true],
            "when" => ["2024-01-01", "2024-01-02", "bad"],
        }
        .unwrap()
    }

    #[test]
    fn test_infers_kinds_from_dtypes() {
        let table = Table::new(sample());
        assert_eq!(table.kind("id").unwrap(), ColumnKind::Numeric);
        assert_eq!(table.kind("score").unwrap(), ColumnKind::Numeric);
        assert_eq!(table.kind("name").unwrap(), ColumnKind::Text);
        assert_eq!(table.kind("flag").unwrap(), ColumnKind::Categorical);
        assert_eq!(table.kind("when").unwrap(), ColumnKind::Text);
        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 5);
    }

    #[test]
    fn test_with_kinds_overrides() {
        let table = Table::with_kinds(
            sample(),
            [("when", ColumnKind::Temporal), ("name", ColumnKind::Categorical)],
        )
        .unwrap();
        assert_eq!(table.kind("when").unwrap(), ColumnKind::Temporal);
        assert_eq!(table.kind("name").unwrap(), ColumnKind::Categorical);
    }

    #[test]
    fn test_with_kinds_unknown_column() {
        let err = Table::with_kinds(sample(), [("nope", ColumnKind::Numeric)]).unwrap_err();
        assert!(matches!(err, AuditError::ColumnNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_with_kinds_incompatible_dtype() {
        let err = Table::with_kinds(sample(), [("flag", ColumnKind::Numeric)]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_series_missing_column() {
        let table = Table::new(sample());
        assert!(table.series("id").is_ok());
        assert!(matches!(
            table.series("missing"),
            Err(AuditError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_derive_keeps_declared_kinds() {
        let table = Table::with_kinds(sample(), [("when", ColumnKind::Temporal)]).unwrap();
        let filtered = table.frame().head(Some(2));
        let derived = table.derive(filtered);
        assert_eq!(derived.height(), 2);
        assert_eq!(derived.kind("when").unwrap(), ColumnKind::Temporal);
    }

    #[test]
    fn test_derive_reinfers_changed_dtype() {
        let table = Table::with_kinds(sample(), [("name", ColumnKind::Categorical)]).unwrap();
        let mut df = table.frame().clone();
        df.replace("name", Series::new("name".into(), &[1i64, 2, 3]))
            .unwrap();
        let derived = table.derive(df);
        assert_eq!(derived.kind("name").unwrap(), ColumnKind::Numeric);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }
}
