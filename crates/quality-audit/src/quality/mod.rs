//! Data quality auditing.
//!
//! This module scores a table along four dimensions (completeness,
//! consistency, accuracy, timeliness) and collects severity-tagged
//! findings into an [`crate::types::AuditReport`].

mod analyzer;

pub use analyzer::DataQualityAuditor;
