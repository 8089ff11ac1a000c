//! Caller-owned working set: the original table, the current table and
//! the append-only cleaning history.
//!
//! The cleaning functions in [`crate::cleaner`] never touch history. A
//! [`WorkingSet`] threads their outcomes together the way an interactive
//! session does: every applied step replaces the current table and
//! appends one [`CleaningLogEntry`]; a reset restores the original table
//! and starts a fresh history.
//!
//! # Thread Safety
//!
//! `WorkingSet` itself does no locking. Callers that share one across
//! threads wrap it in [`SharedWorkingSet`] (a `parking_lot::RwLock`) so
//! that writers are serialized.

use crate::cleaner::{CleaningOperation, CleaningOutcome};
use crate::error::Result;
use crate::table::Table;
use crate::types::{CleaningLogEntry, OperationKind};
use chrono::Local;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// A working set behind a read-write lock, for sharing across threads.
pub type SharedWorkingSet = Arc<RwLock<WorkingSet>>;

/// Original table, current table and cleaning history.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    original: Table,
    current: Table,
    history: Vec<CleaningLogEntry>,
}

impl WorkingSet {
    pub fn new(table: Table) -> Self {
        Self {
            current: table.clone(),
            original: table,
            history: Vec::new(),
        }
    }

    /// Wrap into a [`SharedWorkingSet`].
    pub fn into_shared(self) -> SharedWorkingSet {
        Arc::new(RwLock::new(self))
    }

    pub fn current(&self) -> &Table {
        &self.current
    }

    pub fn original(&self) -> &Table {
        &self.original
    }

    /// Entries in the order they were recorded.
    pub fn history(&self) -> &[CleaningLogEntry] {
        &self.history
    }

    pub fn into_current(self) -> Table {
        self.current
    }

    /// Rows removed from the original so far.
    pub fn rows_removed(&self) -> usize {
        self.original.height().saturating_sub(self.current.height())
    }

    /// Swap in an outcome's table and append its log entry.
    pub fn record(&mut self, operation: OperationKind, outcome: CleaningOutcome) -> &CleaningLogEntry {
        debug!(
            "Recording {} ({} rows affected)",
            operation.display_name(),
            outcome.rows_affected
        );
        self.current = outcome.table;
        self.push_entry(operation, outcome.details, outcome.rows_affected)
    }

    /// Run an operation against the current table and record it.
    ///
    /// An imputation that changed nothing is not recorded and yields
    /// `Ok(None)`; every other successful operation is recorded. On error
    /// the working set is left untouched.
    pub fn apply(&mut self, operation: &CleaningOperation) -> Result<Option<CleaningLogEntry>> {
        let outcome = operation.apply(&self.current)?;
        let kind = operation.kind();
        info!("{}: {}", operation, outcome.details);

        if kind == OperationKind::Imputation && outcome.rows_affected == 0 {
            return Ok(None);
        }
        Ok(Some(self.record(kind, outcome).clone()))
    }

    /// Restore the original table and clear the history.
    ///
    /// The fresh history holds a single `Reset` entry whose
    /// `rows_affected` is the number of rows restored.
    pub fn reset(&mut self) -> &CleaningLogEntry {
        let restored = self.rows_removed();
        info!("Resetting working set ({} rows restored)", restored);

        self.current = self.original.clone();
        self.history.clear();
        self.push_entry(
            OperationKind::Reset,
            "Dataset reset to original state.".to_string(),
            restored,
        )
    }

    fn push_entry(
        &mut self,
        operation: OperationKind,
        details: String,
        rows_affected: usize,
    ) -> &CleaningLogEntry {
        self.history.push(CleaningLogEntry {
            timestamp: Local::now().naive_local(),
            operation,
            details,
            rows_affected,
        });
        // just pushed
        &self.history[self.history.len() - 1]
    }
}
