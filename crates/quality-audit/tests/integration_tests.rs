//! Integration tests for the audit and cleaning core.
//!
//! These tests verify end-to-end behavior through the public API using
//! generated tables and a small crash-report fixture.

use chrono::{NaiveDate, NaiveDateTime};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use quality_audit::{
    AuditConfig, AuditError, CleaningOperation, ColumnKind, ColumnStatus, DataQualityAuditor, Freshness, ImputationStrategy,
    OperationKind, OutlierDetector, QualityDimension, Severity, SkipReason, Table, WorkingSet,
    impute_values, remove_duplicates, standardize_dates,
};
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn audit_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn id_only_config(key_fields: &[&str]) -> AuditConfig {
    AuditConfig::builder()
        .key_fields(key_fields.iter().copied())
        .primary_id_column("ID")
        .without_primary_timestamp()
        .without_model_year()
        .build()
        .unwrap()
}

/// Deterministic pseudo-random values (64-bit LCG).
fn lcg_values(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 33) % 1000) as f64 / 10.0
        })
        .collect()
}

// ============================================================================
// Audit Properties
// ============================================================================

#[test]
fn test_key_field_with_fifteen_percent_missing_is_critical() {
    let ids: Vec<Option<i64>> = (0..100)
        .map(|i| if i % 6 == 0 && i < 90 { None } else { Some(i) })
        .collect();
    assert_eq!(ids.iter().filter(|v| v.is_none()).count(), 15);

    let df = df! { "ID" => ids }.unwrap();
    let config = AuditConfig::builder()
        .key_fields(["ID"])
        .without_primary_id()
        .build()
        .unwrap();

    let report = DataQualityAuditor::new(config).audit_at(&Table::new(df), audit_instant());

    assert!(report.health_score <= 90);
    let profile = report.profile("ID").unwrap();
    assert_eq!(profile.status, ColumnStatus::Critical);
    assert_eq!(profile.missing_percentage, 15.0);

    let critical: Vec<_> = report.findings_with(Severity::Critical).collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].dimension, QualityDimension::Completeness);
    assert_eq!(critical[0].column.as_deref(), Some("ID"));
}

#[test]
fn test_three_duplicates_in_fifty_rows() {
    let mut ids: Vec<i64> = (0..47).collect();
    ids.extend([3, 11, 29]);
    let df = df! { "ID" => ids }.unwrap();

    let report =
        DataQualityAuditor::new(id_only_config(&[])).audit_at(&Table::new(df), audit_instant());

    let consistency = report.consistency.as_ref().unwrap();
    assert_eq!(consistency.duplicate_count, 3);
    assert_eq!(consistency.duplicate_rate, 6.0);
    assert_eq!(report.health_score, 88);
    assert_eq!(
        report.findings[0].message,
        "Found 3 duplicate 'ID' entries (6.00% rate)."
    );
}

#[test]
fn test_empty_table_scores_zero_with_one_finding() {
    let df = df! { "ID" => Vec::<i64>::new() }.unwrap();
    let report = DataQualityAuditor::default().audit_at(&Table::new(df), audit_instant());

    assert_eq!(report.health_score, 0);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].severity, Severity::Critical);
    assert_eq!(report.findings[0].message, "Dataset is empty.");
    assert!(report.column_profiles.is_empty());

    let report = DataQualityAuditor::default().audit(&Table::empty());
    assert_eq!(report.health_score, 0);
}

#[test]
fn test_score_stays_in_bounds_when_everything_is_wrong() {
    // every penalty fires at once
    let df = df! {
        "Report Number" => [None, None, None, None, Some("A")],
        "Crash Date/Time" => [Some("2099-01-01"), None, None, None, None],
        "Vehicle ID" => [None::<&str>, None, None, None, None],
        "Person ID" => [None::<&str>, None, None, None, None],
        "Vehicle Year" => [3000i64, 3000, 3000, 3000, 3000],
    }
    .unwrap();

    let report = DataQualityAuditor::default().audit_at(&Table::new(df), audit_instant());
    // 4 critical keys (-40), duplicates capped (-20), future (-10), model year (-5)
    assert_eq!(report.health_score, 25);
    assert!(report.health_score <= 100);

    let strict = AuditConfig {
        critical_key_penalty: 60,
        ..AuditConfig::default()
    };
    let report = DataQualityAuditor::new(strict).audit_at(
        &Table::new(
            df! {
                "Report Number" => [None::<&str>, None],
                "Person ID" => [None::<&str>, None],
            }
            .unwrap(),
        ),
        audit_instant(),
    );
    assert_eq!(report.health_score, 0);
}

#[test]
fn test_audit_is_idempotent() {
    let table = Table::new(load_csv("crash_reports.csv"));
    let auditor = DataQualityAuditor::default();

    let first = auditor.audit_at(&table, audit_instant());
    let second = auditor.audit_at(&table, audit_instant());
    assert_eq!(first, second);
}

#[test]
fn test_outlier_count_matches_reference_quantiles() {
    let mut values = lcg_values(200, 42);
    values.extend([-500.0, 900.0, 1250.5]);
    let df = df! { "reading" => values.clone() }.unwrap();
    let table = Table::new(df);

    // reference: numpy-style "linear" quantiles computed independently
    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let reference_quantile = |q: f64| {
        let h = (sorted.len() as f64 - 1.0) * q;
        let below = sorted[h.floor() as usize];
        let above = sorted[(h.floor() as usize + 1).min(sorted.len() - 1)];
        below + (h - h.floor()) * (above - below)
    };
    let (q1, q3) = (reference_quantile(0.25), reference_quantile(0.75));
    let (lower, upper) = (q1 - 1.5 * (q3 - q1), q3 + 1.5 * (q3 - q1));
    let expected = values.iter().filter(|&&v| v < lower || v > upper).count();

    let summary = OutlierDetector::detect(&table, "reading", 1.5).unwrap();
    assert_eq!(summary.count, expected);
    assert!(summary.count >= 3);
    assert_eq!(summary.mask.len(), values.len());

    let report = DataQualityAuditor::default().audit_at(&table, audit_instant());
    assert_eq!(report.profile("reading").unwrap().outlier_count, expected);
}

// ============================================================================
// Cleaning Properties
// ============================================================================

#[test]
fn test_remove_duplicates_twice_reports_zero() {
    let df = df! {
        "ID" => [1i64, 2, 2, 3, 1],
        "Value" => ["a", "b", "b", "c", "a"],
    }
    .unwrap();
    let table = Table::new(df);

    let first = remove_duplicates(&table, None).unwrap();
    assert_eq!(first.rows_affected, 2);

    let second = remove_duplicates(&first.table, None).unwrap();
    assert_eq!(second.rows_affected, 0);
    assert_eq!(second.table.height(), 3);
}

#[test]
fn test_mean_imputation_fills_with_prior_mean() {
    let df = df! {
        "Vehicle Year" => [Some(2010i64), None, Some(2014), None, Some(2021), Some(2019)],
    }
    .unwrap();
    let table = Table::new(df);

    let prior_mean = table
        .series("Vehicle Year")
        .unwrap()
        .mean()
        .unwrap();

    let outcome = impute_values(&table, "Vehicle Year", ImputationStrategy::Mean).unwrap();
    assert_eq!(outcome.rows_affected, 2);

    let filled = outcome.table.series("Vehicle Year").unwrap();
    assert_eq!(filled.null_count(), 0);
    let values = filled.f64().unwrap();
    assert_eq!(values.get(1), Some(prior_mean));
    assert_eq!(values.get(3), Some(prior_mean));
    assert_eq!(values.get(0), Some(2010.0));
}

#[test]
fn test_standardize_dates_counts_newly_null() {
    let raw = vec![
        Some("2024-01-01"),
        Some("2024-01-02 10:00:00"),
        Some("01/03/2024"),
        Some("yesterday"),
        Some("2024-01-05T08:00:00"),
        None,
        Some("2024-01-06"),
        Some("13/45/2024"),
        Some("2024-01-08"),
        Some("2024-01-09"),
        Some("2024-01-10"),
    ];
    let df = df! { "when" => raw }.unwrap();
    let table = Table::new(df);

    let outcome = standardize_dates(&table, "when").unwrap();
    assert_eq!(outcome.rows_affected, 10);
    assert!(
        outcome
            .details
            .ends_with("Caution: 2 invalid date formats were coerced to Null."),
        "details: {}",
        outcome.details
    );
    assert_eq!(outcome.table.series("when").unwrap().null_count(), 3);
}

#[test]
fn test_drop_strategy_without_missing_values() {
    let df = df! { "ID" => [1i64, 2, 3] }.unwrap();
    let table = Table::new(df);

    let outcome = impute_values(&table, "ID", ImputationStrategy::Drop).unwrap();
    assert_eq!(outcome.rows_affected, 0);
    assert_eq!(outcome.details, "No missing values in 'ID'.");
    assert!(outcome.table.frame().equals_missing(table.frame()));
}

#[test]
fn test_unknown_column_is_caller_error() {
    let table = Table::new(df! { "ID" => [1i64] }.unwrap());
    let err = impute_values(&table, "Missing", ImputationStrategy::Mode).unwrap_err();
    assert!(matches!(err, AuditError::ColumnNotFound(_)));
    assert!(err.is_invalid_parameter());
}

#[test]
fn test_impute_text_stored_numbers_with_junk_cells() {
    let df = df! {
        "Speed Limit" => [Some("35"), Some("n/a"), None, Some("45"), Some("unknown"), Some("40")],
    }
    .unwrap();
    let table = Table::with_kinds(df, [("Speed Limit", ColumnKind::Numeric)]).unwrap();

    for strategy in [ImputationStrategy::Mean, ImputationStrategy::Median] {
        let outcome = impute_values(&table, "Speed Limit", strategy).unwrap();
        let filled = outcome.table.series("Speed Limit").unwrap();

        assert_eq!(filled.null_count(), 0, "{} left nulls", strategy);
        assert_eq!(outcome.rows_affected, 1);
        assert!(outcome.details.contains("Caution: 2 non-numeric values"));
        assert_eq!(filled.f64().unwrap().get(1), Some(40.0));
    }
}

#[test]
fn test_rows_affected_matches_observed_delta() {
    let df = df! {
        "ID" => [Some(1i64), Some(2), Some(2), None, Some(4), None],
        "Reading" => [Some(1.5), None, None, Some(3.0), Some(-0.0), Some(0.0)],
        "When" => [Some("2024-01-01"), Some("bad"), None, Some("01/02/2024"), None, Some("2024-03-01")],
    }
    .unwrap();
    let table = Table::new(df);

    for step in [
        "impute:Reading:Mean",
        "impute:Reading:Median",
        "impute:Reading:Mode",
        "impute:ID:Drop",
        "dedupe",
        "dedupe:ID",
        "dropna",
        "dropna:When",
    ] {
        let operation: CleaningOperation = step.parse().unwrap();
        let outcome = operation.apply(&table).unwrap();

        let row_delta = table.height() - outcome.table.height();
        let delta = if row_delta > 0 {
            row_delta
        } else {
            let before = table.series("Reading").unwrap().null_count();
            before - outcome.table.series("Reading").unwrap().null_count()
        };
        assert_eq!(outcome.rows_affected, delta, "step {}", step);
    }

    // dates count converted values, and every newly-null one is reported
    let outcome = standardize_dates(&table, "When").unwrap();
    let before = table.series("When").unwrap().null_count();
    let after = outcome.table.series("When").unwrap().null_count();
    assert_eq!(outcome.rows_affected, table.height() - before);
    assert!(
        outcome
            .details
            .contains(&format!("Caution: {} invalid", after - before))
    );
}

// ============================================================================
// End-to-End with Fixture
// ============================================================================

#[test]
fn test_crash_fixture_audit() {
    let table = Table::new(load_csv("crash_reports.csv"));
    let report = DataQualityAuditor::default().audit_at(&table, audit_instant());

    // Person ID warning (-5), one duplicate report (-10),
    // one future crash (-10), one future model year (-5)
    assert_eq!(report.health_score, 70);
    assert_eq!(report.shape.rows, 20);
    assert_eq!(report.shape.columns, 7);
    assert!(report.skipped_checks.is_empty());

    let consistency = report.consistency.as_ref().unwrap();
    assert_eq!(consistency.duplicate_count, 1);

    let accuracy = report.accuracy.as_ref().unwrap();
    assert_eq!(accuracy.future_timestamps, Some(1));
    assert_eq!(accuracy.invalid_model_years, Some(1));

    let timeliness = report.timeliness.as_ref().unwrap();
    assert_eq!(timeliness.freshness, Freshness::Fresh);

    let person = report.profile("Person ID").unwrap();
    assert_eq!(person.status, ColumnStatus::Warning);
    assert_eq!(person.missing_percentage, 5.0);
}

#[test]
fn test_crash_fixture_cleaning_session() {
    let mut session = WorkingSet::new(Table::new(load_csv("crash_reports.csv")));
    let auditor = DataQualityAuditor::default();

    for step in [
        "dedupe:Report Number",
        "dates:Crash Date/Time",
        "impute:Vehicle Year:Median",
        "impute:Person ID:Mode",
    ] {
        session.apply(&step.parse().unwrap()).unwrap();
    }

    let kinds: Vec<OperationKind> = session.history().iter().map(|e| e.operation).collect();
    assert_eq!(
        kinds,
        vec![
            OperationKind::RemoveDuplicates,
            OperationKind::Standardization,
            OperationKind::Imputation,
            OperationKind::Imputation,
        ]
    );
    assert_eq!(session.history()[0].rows_affected, 1);
    assert!(session.history()[1].details.contains("Caution: 1 invalid"));

    let report = auditor.audit_at(session.current(), audit_instant());
    // the coerced crash date is now missing (-5); the future crash date
    // and model year remain (-15)
    assert_eq!(report.health_score, 80);
    assert_eq!(report.consistency.as_ref().unwrap().duplicate_count, 0);
    assert_eq!(
        report.profile("Crash Date/Time").unwrap().status,
        ColumnStatus::Warning
    );

    let entry = session.reset().clone();
    assert_eq!(entry.operation, OperationKind::Reset);
    assert_eq!(entry.rows_affected, 1);
    assert_eq!(session.history().len(), 1);
    assert_eq!(
        auditor.audit_at(session.current(), audit_instant()).health_score,
        70
    );
}

#[test]
fn test_missing_default_columns_are_skipped_not_fatal() {
    let df = df! { "Other" => [1i64, 2, 3] }.unwrap();
    let report = DataQualityAuditor::default().audit_at(&Table::new(df), audit_instant());

    assert_eq!(report.health_score, 100);
    assert_eq!(report.skipped_checks.len(), 4);
    assert!(
        report
            .skipped_checks
            .iter()
            .all(|s| s.reason == SkipReason::MissingColumn)
    );
}

#[test]
fn test_report_serializes_to_json() {
    let table = Table::new(load_csv("crash_reports.csv"));
    let report = DataQualityAuditor::default().audit_at(&table, audit_instant());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["health_score"], 70);
    assert_eq!(json["findings"][0]["severity"], "warning");
    assert_eq!(json["column_profiles"].as_array().unwrap().len(), 7);
}
