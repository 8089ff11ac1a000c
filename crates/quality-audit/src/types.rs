use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// =============================================================================
// Column Kinds
// =============================================================================

/// Semantic kind of a column, decided once when a [`crate::Table`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
    Categorical,
}

impl ColumnKind {
    /// Lowercase name used in error messages and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Temporal => "temporal",
            Self::Categorical => "categorical",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Missing-value status of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStatus {
    Valid,
    Warning,
    Critical,
}

impl ColumnStatus {
    /// Classify a raw (unrounded) missing percentage.
    pub fn from_missing_pct(pct: f64, critical_pct: f64) -> Self {
        if pct > critical_pct {
            Self::Critical
        } else if pct > 0.0 {
            Self::Warning
        } else {
            Self::Valid
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

/// Per-column diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Polars dtype as rendered by `Display`.
    pub dtype: String,
    pub missing_count: usize,
    /// Rounded to two decimals.
    pub missing_percentage: f64,
    /// Unique non-null values.
    pub distinct_count: usize,
    pub outlier_count: usize,
    pub status: ColumnStatus,
}

/// One row of the data dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub name: String,
    pub kind: ColumnKind,
    pub dtype: String,
    pub non_null_count: usize,
    /// First non-null value, rendered as text.
    pub example_value: Option<String>,
}

// =============================================================================
// Findings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityDimension {
    Completeness,
    Consistency,
    Accuracy,
    Timeliness,
}

/// A single audit observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub dimension: QualityDimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl Finding {
    pub fn new(
        severity: Severity,
        dimension: QualityDimension,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            dimension,
            column: None,
            message: message.into(),
        }
    }

    /// Attach the column the finding is about.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

// =============================================================================
// Dimension Metrics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    pub column: String,
    pub duplicate_count: usize,
    /// Percentage of rows.
    pub duplicate_rate: f64,
}

/// Counts for each accuracy sub-check; `None` means the sub-check did not run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub future_timestamps: Option<usize>,
    pub invalid_model_years: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinessMetrics {
    pub latest: NaiveDateTime,
    /// Whole days between `latest` and the audit instant (floored).
    pub age_days: i64,
    pub freshness: Freshness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub columns: usize,
    pub estimated_size_mb: f64,
}

// =============================================================================
// Skipped Checks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCheck {
    Consistency,
    FutureTimestamps,
    ModelYears,
    Timeliness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The configured column is not in the table.
    MissingColumn,
    /// The column exists but none of its values could be coerced.
    UnsupportedColumnType,
}

/// An audit step that did not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCheck {
    pub check: AuditCheck,
    pub column: String,
    pub reason: SkipReason,
}

// =============================================================================
// Audit Report
// =============================================================================

/// Result of one audit. Built fresh per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// 0 - 100.
    pub health_score: u8,
    pub findings: Vec<Finding>,
    /// One entry per column, in table order.
    pub column_profiles: Vec<ColumnProfile>,
    pub consistency: Option<ConsistencyMetrics>,
    pub accuracy: Option<AccuracyMetrics>,
    pub timeliness: Option<TimelinessMetrics>,
    pub shape: DatasetShape,
    pub skipped_checks: Vec<SkippedCheck>,
}

impl AuditReport {
    /// Findings of the given severity, in report order.
    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Look up the profile of a column by name.
    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|p| p.name == column)
    }
}

// =============================================================================
// Cleaning Log
// =============================================================================

/// Types of operations recorded in the cleaning history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Missing values were filled or their rows dropped.
    Imputation,
    /// A column was coerced to datetime.
    Standardization,
    /// Duplicate rows were removed.
    RemoveDuplicates,
    /// Rows with missing values were removed.
    DropMissing,
    /// The working table was restored to the original.
    Reset,
}

impl OperationKind {
    /// Get a human-readable display name for the operation.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Imputation => "Imputation",
            Self::Standardization => "Standardization",
            Self::RemoveDuplicates => "Remove Duplicates",
            Self::DropMissing => "Drop Missing",
            Self::Reset => "Reset",
        }
    }
}

/// One entry of the append-only cleaning history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningLogEntry {
    pub timestamp: NaiveDateTime,
    pub operation: OperationKind,
    pub details: String,
    pub rows_affected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bands() {
        assert_eq!(ColumnStatus::from_missing_pct(0.0, 10.0), ColumnStatus::Valid);
        assert_eq!(ColumnStatus::from_missing_pct(0.5, 10.0), ColumnStatus::Warning);
        assert_eq!(ColumnStatus::from_missing_pct(10.0, 10.0), ColumnStatus::Warning);
        assert_eq!(ColumnStatus::from_missing_pct(10.01, 10.0), ColumnStatus::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_finding_serialization() {
        let finding = Finding::new(
            Severity::Critical,
            QualityDimension::Completeness,
            "Key field 'ID' has 15.00% missing values.",
        )
        .with_column("ID");

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["dimension"], "completeness");
        assert_eq!(json["column"], "ID");
    }

    #[test]
    fn test_operation_display_name() {
        assert_eq!(OperationKind::RemoveDuplicates.display_name(), "Remove Duplicates");
        assert_eq!(OperationKind::Reset.display_name(), "Reset");
    }
}
