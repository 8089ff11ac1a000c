use crate::config::AuditConfig;
use crate::profiler::ColumnProfiler;
use crate::table::Table;
use crate::temporal::{MILLIS_PER_DAY, datetime_to_millis, millis_to_datetime, timestamp_millis};
use crate::types::{
    AccuracyMetrics, AuditCheck, AuditReport, ColumnProfile, ColumnStatus, ConsistencyMetrics,
    DatasetShape, Finding, Freshness, QualityDimension, Severity, SkipReason, SkippedCheck,
    TimelinessMetrics,
};
use crate::utils::{numeric_values, percentage, round2};
use chrono::{Datelike, NaiveDateTime, Utc};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Scores a table along completeness, consistency, accuracy and timeliness.
///
/// The auditor holds only configuration; every call builds a fresh
/// [`AuditReport`] and retains nothing from the table.
#[derive(Debug, Clone, Default)]
pub struct DataQualityAuditor {
    config: AuditConfig,
}

/// Mutable accumulator for one audit run.
struct AuditRun {
    score: i32,
    findings: Vec<Finding>,
    skipped: Vec<SkippedCheck>,
}

impl AuditRun {
    fn penalize(&mut self, points: u32, finding: Finding) {
        debug!("-{} points: {}", points, finding.message);
        self.score -= points as i32;
        self.findings.push(finding);
    }

    fn skip(&mut self, check: AuditCheck, column: &str, reason: SkipReason) {
        warn!("Skipping {:?} check on '{}': {:?}", check, column, reason);
        self.skipped.push(SkippedCheck {
            check,
            column: column.to_string(),
            reason,
        });
    }
}

impl DataQualityAuditor {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Audit a table against the current UTC time.
    pub fn audit(&self, table: &Table) -> AuditReport {
        self.audit_at(table, Utc::now().naive_utc())
    }

    /// Audit a table against an explicit instant.
    ///
    /// `now` is on the same naive clock as the coerced timestamps: zoned
    /// and epoch values are read as UTC, zone-less text as written.
    ///
    /// Missing or unreadable optional columns never abort the audit; the
    /// affected check is listed in `skipped_checks` instead.
    pub fn audit_at(&self, table: &Table, now: NaiveDateTime) -> AuditReport {
        let shape = DatasetShape {
            rows: table.height(),
            columns: table.width(),
            estimated_size_mb: round2(table.frame().estimated_size() as f64 / 1024.0 / 1024.0),
        };

        if table.is_empty() {
            info!("Audit skipped: dataset is empty");
            return AuditReport {
                health_score: 0,
                findings: vec![Finding::new(
                    Severity::Critical,
                    QualityDimension::Completeness,
                    "Dataset is empty.",
                )],
                column_profiles: Vec::new(),
                consistency: None,
                accuracy: None,
                timeliness: None,
                shape,
                skipped_checks: Vec::new(),
            };
        }

        info!("Auditing {} rows x {} columns", shape.rows, shape.columns);

        let mut run = AuditRun {
            score: 100,
            findings: Vec::new(),
            skipped: Vec::new(),
        };

        let column_profiles = ColumnProfiler::profile_table(table, &self.config);
        self.check_completeness(&column_profiles, table.height(), &mut run);

        let consistency = self.check_consistency(table, &mut run);

        let timestamps = self.primary_timestamps(table, &mut run);
        let accuracy = self.check_accuracy(table, timestamps.as_deref(), now, &mut run);
        let timeliness = self.check_timeliness(timestamps.as_deref(), now, &mut run);

        let health_score = run.score.clamp(0, 100) as u8;
        info!(
            "Audit complete: score {} with {} findings",
            health_score,
            run.findings.len()
        );

        AuditReport {
            health_score,
            findings: run.findings,
            column_profiles,
            consistency,
            accuracy,
            timeliness,
            shape,
            skipped_checks: run.skipped,
        }
    }

    // =========================================================================
    // Completeness
    // =========================================================================

    fn check_completeness(&self, profiles: &[ColumnProfile], rows: usize, run: &mut AuditRun) {
        for profile in profiles {
            if !self.config.is_key_field(&profile.name) {
                continue;
            }
            let missing_pct = percentage(profile.missing_count, rows);
            let message = format!(
                "Key field '{}' has {:.2}% missing values.",
                profile.name, profile.missing_percentage
            );

            match profile.status {
                ColumnStatus::Critical => run.penalize(
                    self.config.critical_key_penalty,
                    Finding::new(Severity::Critical, QualityDimension::Completeness, message)
                        .with_column(&profile.name),
                ),
                ColumnStatus::Warning if missing_pct > self.config.key_warning_floor_pct =>
                {
                    run.penalize(
                        self.config.warning_key_penalty,
                        Finding::new(Severity::Warning, QualityDimension::Completeness, message)
                            .with_column(&profile.name),
                    )
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    fn check_consistency(&self, table: &Table, run: &mut AuditRun) -> Option<ConsistencyMetrics> {
        let column = self.config.primary_id_column.as_deref()?;
        if !table.has_column(column) {
            run.skip(AuditCheck::Consistency, column, SkipReason::MissingColumn);
            return None;
        }

        let distinct = table
            .frame()
            .select([column])
            .and_then(|ids| ids.unique_stable(None, UniqueKeepStrategy::First, None));
        let distinct = match distinct {
            Ok(ids) => ids.height(),
            Err(e) => {
                warn!("Could not compare identifiers in '{}': {}", column, e);
                run.skip(AuditCheck::Consistency, column, SkipReason::UnsupportedColumnType);
                return None;
            }
        };

        let duplicate_count = table.height() - distinct;
        let duplicate_rate = percentage(duplicate_count, table.height());

        if duplicate_count > 0 {
            let raw_penalty = (duplicate_rate * self.config.duplicate_rate_multiplier).floor();
            let penalty = (raw_penalty as u32).min(self.config.duplicate_penalty_cap);
            run.penalize(
                penalty,
                Finding::new(
                    Severity::Warning,
                    QualityDimension::Consistency,
                    format!(
                        "Found {} duplicate '{}' entries ({:.2}% rate).",
                        duplicate_count, column, duplicate_rate
                    ),
                )
                .with_column(column),
            );
        }

        Some(ConsistencyMetrics {
            column: column.to_string(),
            duplicate_count,
            duplicate_rate,
        })
    }

    // =========================================================================
    // Accuracy
    // =========================================================================

    /// Coerce the primary timestamp column once for accuracy and timeliness.
    ///
    /// Records skips for both checks when the column is absent or
    /// unreadable.
    fn primary_timestamps(&self, table: &Table, run: &mut AuditRun) -> Option<Vec<Option<i64>>> {
        let column = self.config.primary_timestamp_column.as_deref()?;

        let Ok(series) = table.series(column) else {
            run.skip(AuditCheck::FutureTimestamps, column, SkipReason::MissingColumn);
            run.skip(AuditCheck::Timeliness, column, SkipReason::MissingColumn);
            return None;
        };

        let coerced = match timestamp_millis(series) {
            Ok(Some(values)) if readable(series, values.iter().flatten().count()) => Some(values),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not read timestamps from '{}': {}", column, e);
                None
            }
        };

        if coerced.is_none() {
            run.skip(AuditCheck::FutureTimestamps, column, SkipReason::UnsupportedColumnType);
            run.skip(AuditCheck::Timeliness, column, SkipReason::UnsupportedColumnType);
        }
        coerced
    }

    fn check_accuracy(
        &self,
        table: &Table,
        timestamps: Option<&[Option<i64>]>,
        now: NaiveDateTime,
        run: &mut AuditRun,
    ) -> Option<AccuracyMetrics> {
        let mut metrics = AccuracyMetrics::default();

        if let (Some(values), Some(column)) =
            (timestamps, self.config.primary_timestamp_column.as_deref())
        {
            let now_ms = datetime_to_millis(now);
            let future = values.iter().flatten().filter(|&&ms| ms > now_ms).count();
            if future > 0 {
                run.penalize(
                    self.config.future_timestamp_penalty,
                    Finding::new(
                        Severity::Critical,
                        QualityDimension::Accuracy,
                        format!("Found {} records with '{}' in the future.", future, column),
                    )
                    .with_column(column),
                );
            }
            metrics.future_timestamps = Some(future);
        }

        if let Some(column) = self.config.model_year_column.as_deref() {
            metrics.invalid_model_years = self.count_invalid_model_years(table, column, now, run);
        }

        if metrics.future_timestamps.is_none() && metrics.invalid_model_years.is_none() {
            None
        } else {
            Some(metrics)
        }
    }

    fn count_invalid_model_years(
        &self,
        table: &Table,
        column: &str,
        now: NaiveDateTime,
        run: &mut AuditRun,
    ) -> Option<usize> {
        let Ok(series) = table.series(column) else {
            run.skip(AuditCheck::ModelYears, column, SkipReason::MissingColumn);
            return None;
        };

        let years = match numeric_values(series) {
            Ok(Some(values)) if readable(series, values.iter().flatten().count()) => values,
            Ok(_) => {
                run.skip(AuditCheck::ModelYears, column, SkipReason::UnsupportedColumnType);
                return None;
            }
            Err(e) => {
                warn!("Could not read model years from '{}': {}", column, e);
                run.skip(AuditCheck::ModelYears, column, SkipReason::UnsupportedColumnType);
                return None;
            }
        };

        let max_year = (now.year() + self.config.model_year_tolerance) as f64;
        let invalid = years.iter().flatten().filter(|&&y| y > max_year).count();
        if invalid > 0 {
            run.penalize(
                self.config.invalid_model_year_penalty,
                Finding::new(
                    Severity::Warning,
                    QualityDimension::Accuracy,
                    format!(
                        "Found {} records with invalid future model years in '{}'.",
                        invalid, column
                    ),
                )
                .with_column(column),
            );
        }
        Some(invalid)
    }

    // =========================================================================
    // Timeliness
    // =========================================================================

    fn check_timeliness(
        &self,
        timestamps: Option<&[Option<i64>]>,
        now: NaiveDateTime,
        run: &mut AuditRun,
    ) -> Option<TimelinessMetrics> {
        let latest_ms = timestamps?.iter().flatten().copied().max()?;
        let latest = millis_to_datetime(latest_ms)?;
        let age_days = (datetime_to_millis(now) - latest_ms).div_euclid(MILLIS_PER_DAY);

        let freshness = if age_days < self.config.freshness_days {
            Freshness::Fresh
        } else {
            Freshness::Stale
        };

        let mut finding = Finding::new(
            Severity::Info,
            QualityDimension::Timeliness,
            format!(
                "Timeliness: Latest record is from {} ({} days old, {}).",
                latest.format("%Y-%m-%d"),
                age_days,
                match freshness {
                    Freshness::Fresh => "fresh",
                    Freshness::Stale => "stale",
                }
            ),
        );
        if let Some(column) = self.config.primary_timestamp_column.as_deref() {
            finding = finding.with_column(column);
        }
        run.findings.push(finding);

        Some(TimelinessMetrics {
            latest,
            age_days,
            freshness,
        })
    }
}

/// A coerced column is usable unless it had values and none survived.
fn readable(series: &Series, coerced_count: usize) -> bool {
    coerced_count > 0 || series.null_count() == series.len()
}
