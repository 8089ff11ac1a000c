//! Configuration types for the audit engine.
//!
//! Column designations (key fields, primary identifier, primary timestamp,
//! model year) and every scoring threshold live here so the engine itself
//! carries no dataset-specific names. Use [`AuditConfig::builder()`] for a
//! fluent, validated setup.

use serde::{Deserialize, Serialize};

/// Default key fields, taken from the crash-report dataset the scoring
/// rules were written against.
pub const DEFAULT_KEY_FIELDS: [&str; 4] =
    ["Report Number", "Crash Date/Time", "Vehicle ID", "Person ID"];

/// Configuration for the audit engine.
///
/// # Example
///
/// ```rust,ignore
/// use quality_audit::config::AuditConfig;
///
/// let config = AuditConfig::builder()
///     .primary_id_column("ID")
///     .key_fields(["ID", "Timestamp"])
///     .freshness_days(90)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Columns whose missing values affect the health score.
    pub key_fields: Vec<String>,

    /// Column checked for duplicate identifiers.
    /// Default: "Report Number"
    pub primary_id_column: Option<String>,

    /// Column checked for future timestamps and recency.
    /// Default: "Crash Date/Time"
    pub primary_timestamp_column: Option<String>,

    /// Numeric year column checked for impossible future values.
    /// Default: "Vehicle Year"
    pub model_year_column: Option<String>,

    /// Missing percentage above which a column is Critical (0 - 100).
    /// Default: 10.0
    pub critical_missing_pct: f64,

    /// Key fields with a Warning status only cost points (and emit a finding)
    /// when their missing percentage is above this floor.
    /// Default: 0.0
    pub key_warning_floor_pct: f64,

    /// Points deducted for a Critical key field. Default: 10
    pub critical_key_penalty: u32,

    /// Points deducted for a Warning key field. Default: 5
    pub warning_key_penalty: u32,

    /// Maximum points deducted for duplicate identifiers. Default: 20
    pub duplicate_penalty_cap: u32,

    /// Penalty points per percent of duplicate rate. Default: 2.0
    pub duplicate_rate_multiplier: f64,

    /// Points deducted when any timestamp lies in the future. Default: 10
    pub future_timestamp_penalty: u32,

    /// Points deducted when any model year is implausible. Default: 5
    pub invalid_model_year_penalty: u32,

    /// Model years up to `current year + tolerance` are accepted. Default: 1
    pub model_year_tolerance: i32,

    /// Latest record younger than this many days counts as fresh. Default: 180
    pub freshness_days: i64,

    /// Multiplier applied to the IQR for outlier fences. Default: 1.5
    pub iqr_multiplier: f64,

    /// Profile columns on the rayon thread pool. Default: true
    pub parallel_profiling: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            key_fields: DEFAULT_KEY_FIELDS.iter().map(|s| s.to_string()).collect(),
            primary_id_column: Some("Report Number".to_string()),
            primary_timestamp_column: Some("Crash Date/Time".to_string()),
            model_year_column: Some("Vehicle Year".to_string()),
            critical_missing_pct: 10.0,
            key_warning_floor_pct: 0.0,
            critical_key_penalty: 10,
            warning_key_penalty: 5,
            duplicate_penalty_cap: 20,
            duplicate_rate_multiplier: 2.0,
            future_timestamp_penalty: 10,
            invalid_model_year_penalty: 5,
            model_year_tolerance: 1,
            freshness_days: 180,
            iqr_multiplier: 1.5,
            parallel_profiling: true,
        }
    }
}

impl AuditConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Check whether a column is a designated key field.
    pub fn is_key_field(&self, column: &str) -> bool {
        self.key_fields.iter().any(|k| k == column)
    }

    /// Parse a JSON configuration and validate it.
    ///
    /// Fields absent from the document keep their defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("critical_missing_pct", self.critical_missing_pct),
            ("key_warning_floor_pct", self.key_warning_floor_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigValidationError::InvalidPercentage {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.key_warning_floor_pct >= self.critical_missing_pct {
            return Err(ConfigValidationError::OverlappingBands {
                floor: self.key_warning_floor_pct,
                critical: self.critical_missing_pct,
            });
        }

        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ConfigValidationError::InvalidIqrMultiplier(self.iqr_multiplier));
        }

        if !(self.duplicate_rate_multiplier.is_finite() && self.duplicate_rate_multiplier >= 0.0) {
            return Err(ConfigValidationError::InvalidDuplicateMultiplier(
                self.duplicate_rate_multiplier,
            ));
        }

        if self.freshness_days <= 0 {
            return Err(ConfigValidationError::InvalidFreshnessWindow(self.freshness_days));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid percentage for '{field}': {value} (must be between 0 and 100)")]
    InvalidPercentage { field: String, value: f64 },

    #[error("Key warning floor {floor} must be below the critical threshold {critical}")]
    OverlappingBands { floor: f64, critical: f64 },

    #[error("Invalid IQR multiplier: {0} (must be positive)")]
    InvalidIqrMultiplier(f64),

    #[error("Invalid duplicate rate multiplier: {0} (must be non-negative)")]
    InvalidDuplicateMultiplier(f64),

    #[error("Invalid freshness window: {0} days (must be at least 1)")]
    InvalidFreshnessWindow(i64),
}

/// Builder for [`AuditConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AuditConfigBuilder {
    key_fields: Option<Vec<String>>,
    primary_id_column: Option<Option<String>>,
    primary_timestamp_column: Option<Option<String>>,
    model_year_column: Option<Option<String>>,
    critical_missing_pct: Option<f64>,
    key_warning_floor_pct: Option<f64>,
    duplicate_penalty_cap: Option<u32>,
    freshness_days: Option<i64>,
    iqr_multiplier: Option<f64>,
    parallel_profiling: Option<bool>,
}

impl AuditConfigBuilder {
    /// Replace the set of key fields.
    pub fn key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the primary identifier column used by the consistency check.
    pub fn primary_id_column(mut self, column: impl Into<String>) -> Self {
        self.primary_id_column = Some(Some(column.into()));
        self
    }

    /// Disable the consistency check.
    pub fn without_primary_id(mut self) -> Self {
        self.primary_id_column = Some(None);
        self
    }

    /// Set the primary timestamp column used by accuracy and timeliness.
    pub fn primary_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.primary_timestamp_column = Some(Some(column.into()));
        self
    }

    /// Disable the timestamp accuracy and timeliness checks.
    pub fn without_primary_timestamp(mut self) -> Self {
        self.primary_timestamp_column = Some(None);
        self
    }

    /// Set the model year column used by the accuracy check.
    pub fn model_year_column(mut self, column: impl Into<String>) -> Self {
        self.model_year_column = Some(Some(column.into()));
        self
    }

    /// Disable the model year accuracy check.
    pub fn without_model_year(mut self) -> Self {
        self.model_year_column = Some(None);
        self
    }

    /// Set the missing percentage above which a column is Critical.
    ///
    /// # Arguments
    /// * `pct` - Value between 0 and 100 (e.g., 10.0 = 10%)
    pub fn critical_missing_pct(mut self, pct: f64) -> Self {
        self.critical_missing_pct = Some(pct);
        self
    }

    /// Set the floor a Warning key field must exceed before it is penalized.
    ///
    /// `0.0` penalizes any missing value; `1.0` ignores the sub-1% band.
    pub fn key_warning_floor_pct(mut self, pct: f64) -> Self {
        self.key_warning_floor_pct = Some(pct);
        self
    }

    /// Set the maximum duplicate penalty.
    pub fn duplicate_penalty_cap(mut self, cap: u32) -> Self {
        self.duplicate_penalty_cap = Some(cap);
        self
    }

    /// Set the freshness window in days.
    pub fn freshness_days(mut self, days: i64) -> Self {
        self.freshness_days = Some(days);
        self
    }

    /// Set the IQR multiplier for outlier fences.
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Enable or disable parallel column profiling.
    pub fn parallel_profiling(mut self, parallel: bool) -> Self {
        self.parallel_profiling = Some(parallel);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AuditConfig` or an error if validation fails.
    pub fn build(self) -> Result<AuditConfig, ConfigValidationError> {
        let defaults = AuditConfig::default();
        let config = AuditConfig {
            key_fields: self.key_fields.unwrap_or(defaults.key_fields),
            primary_id_column: self.primary_id_column.unwrap_or(defaults.primary_id_column),
            primary_timestamp_column: self
                .primary_timestamp_column
                .unwrap_or(defaults.primary_timestamp_column),
            model_year_column: self.model_year_column.unwrap_or(defaults.model_year_column),
            critical_missing_pct: self
                .critical_missing_pct
                .unwrap_or(defaults.critical_missing_pct),
            key_warning_floor_pct: self
                .key_warning_floor_pct
                .unwrap_or(defaults.key_warning_floor_pct),
            duplicate_penalty_cap: self
                .duplicate_penalty_cap
                .unwrap_or(defaults.duplicate_penalty_cap),
            freshness_days: self.freshness_days.unwrap_or(defaults.freshness_days),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            parallel_profiling: self.parallel_profiling.unwrap_or(defaults.parallel_profiling),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}
