//! Data Quality Audit Library
//!
//! An audit and cleaning core for in-memory tables, built with Rust and Polars.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Auditing**: a 0-100 health score along completeness, consistency,
//!   accuracy and timeliness, with severity-tagged findings
//! - **Profiling**: per-column missing, distinct and IQR outlier statistics
//! - **Cleaning**: imputation, date standardization, deduplication and
//!   dropping missing rows, each returning a new table plus a log detail
//! - **Working sets**: an original table, a current table and an
//!   append-only cleaning history with reset
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quality_audit::{AuditConfig, DataQualityAuditor, Table, WorkingSet};
//! use polars::prelude::*;
//!
//! let table = Table::new(df);
//!
//! let config = AuditConfig::builder()
//!     .key_fields(["Report Number", "Person ID"])
//!     .primary_id_column("Report Number")
//!     .build()?;
//!
//! let report = DataQualityAuditor::new(config).audit(&table);
//! println!("Health score: {}", report.health_score);
//! for finding in &report.findings {
//!     println!("[{}] {}", finding.severity.display_name(), finding.message);
//! }
//!
//! let mut session = WorkingSet::new(table);
//! session.apply(&"dedupe:Report Number".parse()?)?;
//! session.apply(&"impute:Vehicle Year:Median".parse()?)?;
//! for entry in session.history() {
//!     println!("{} - {}", entry.operation.display_name(), entry.details);
//! }
//! ```
//!
//! # Errors
//!
//! Only caller mistakes are errors (unknown columns, unsupported
//! strategies, malformed parameters). Data problems are what the audit
//! reports, so [`DataQualityAuditor::audit`] never fails.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod profiler;
pub mod quality;
pub mod session;
pub mod table;
pub mod temporal;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{
    CleaningOperation, CleaningOutcome, ImputationStrategy, drop_missing_values, impute_values,
    remove_duplicates, standardize_dates,
};
pub use config::{AuditConfig, AuditConfigBuilder, ConfigValidationError};
pub use error::{AuditError, Result, ResultExt};
pub use profiler::{ColumnProfiler, IqrBounds, OutlierDetector, OutlierSummary};
pub use quality::DataQualityAuditor;
pub use session::{SharedWorkingSet, WorkingSet};
pub use table::Table;
pub use types::{
    AccuracyMetrics, AuditCheck, AuditReport, CleaningLogEntry, ColumnKind, ColumnProfile,
    ColumnStatus, ConsistencyMetrics, DatasetShape, DictionaryEntry, Finding, Freshness,
    OperationKind, QualityDimension, Severity, SkipReason, SkippedCheck, TimelinessMetrics,
};

// Tables, reports and working sets cross thread boundaries in callers.
static_assertions::assert_impl_all!(Table: Send, Sync);
static_assertions::assert_impl_all!(AuditReport: Send, Sync);
static_assertions::assert_impl_all!(WorkingSet: Send, Sync);
static_assertions::assert_impl_all!(DataQualityAuditor: Send, Sync);
