//! Custom error types for the audit and cleaning core.
//!
//! Only caller misuse is an error here: unknown columns, unsupported
//! strategies, malformed operation strings and invalid configuration.
//! Data-content anomalies (missing values, bad dates, duplicates) are
//! reported as findings and never surface through this type.
//!
//! Errors are serializable so a rendering layer can display them with a
//! stable code.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for audit and cleaning operations.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// A parameter outside its defined domain (unknown strategy name,
    /// empty key list, malformed operation string).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The strategy exists but cannot be applied to this column kind.
    #[error("Strategy '{strategy}' cannot be applied to {kind} column '{column}'")]
    UnsupportedStrategy {
        column: String,
        strategy: String,
        kind: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AuditError>,
    },
}

impl AuditError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AuditError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for the presentation layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::UnsupportedStrategy { .. } => "UNSUPPORTED_STRATEGY",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a caller/collaborator bug rather than a
    /// processing failure.
    pub fn is_invalid_parameter(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidParameter(_) | Self::UnsupportedStrategy { .. } => {
                true
            }
            Self::WithContext { source, .. } => source.is_invalid_parameter(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for AuditError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        AuditError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AuditError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AuditError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for audit and cleaning operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AuditError::Polars(e).with_context(context))
    }
}
