//! CLI entry point for the data quality audit.

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use quality_audit::{
    AuditConfig, AuditReport, CleaningOperation, ColumnKind, DataQualityAuditor, Table, WorkingSet,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Text columns with fewer distinct values than this share of rows are
/// treated as categorical.
const CATEGORICAL_RATIO: f64 = 0.05;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data quality audit and cleaning for CSV tables",
    long_about = "Scores a table along completeness, consistency, accuracy and timeliness,\n\
                  and applies reversible cleaning steps.\n\n\
                  EXAMPLES:\n  \
                  # Audit with the default column designations\n  \
                  quality-audit audit -i crashes.csv\n\n  \
                  # Audit a dataset with its own identifier and timestamp\n  \
                  quality-audit audit -i orders.csv --id-column order_id --timestamp-column created_at --key-field order_id\n\n  \
                  # Run cleaning steps and compare scores\n  \
                  quality-audit clean -i crashes.csv --step dedupe:\"Report Number\" --step \"impute:Vehicle Year:Median\""
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON is written.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit a CSV file and print the health report
    Audit {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Apply cleaning steps in order and print the history
    Clean {
        #[command(flatten)]
        input: InputArgs,

        /// Cleaning step: impute:COL:STRATEGY, dates:COL, dedupe[:A,B], dropna[:A,B]
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Path to the CSV file to audit
    #[arg(short, long)]
    input: String,

    /// JSON file with audit configuration (unset fields keep defaults)
    #[arg(short, long)]
    config: Option<String>,

    /// Column checked for duplicate identifiers
    #[arg(long)]
    id_column: Option<String>,

    /// Column checked for future and stale timestamps
    #[arg(long)]
    timestamp_column: Option<String>,

    /// Column checked for impossible model years
    #[arg(long)]
    model_year_column: Option<String>,

    /// Key field whose missing values affect the score (repeatable)
    #[arg(long = "key-field")]
    key_fields: Vec<String>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    match &cli.command {
        Command::Audit { input } => run_audit(input, cli.json),
        Command::Clean { input, steps } => run_clean(input, steps, cli.json),
    }
}

fn run_audit(input: &InputArgs, json: bool) -> Result<()> {
    let config = build_config(input)?;
    let table = load_table(&input.input)?;

    let report = DataQualityAuditor::new(config).audit(&table);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&input.input, &report);
    }
    Ok(())
}

fn run_clean(input: &InputArgs, steps: &[String], json: bool) -> Result<()> {
    let operations = steps
        .iter()
        .map(|s| s.parse::<CleaningOperation>())
        .collect::<Result<Vec<_>, _>>()?;

    let auditor = DataQualityAuditor::new(build_config(input)?);
    let mut session = WorkingSet::new(load_table(&input.input)?);
    let before = auditor.audit(session.current());

    for operation in &operations {
        if session.apply(operation)?.is_none() {
            info!("Step '{}' changed nothing and was not recorded", operation);
        }
    }

    let after = auditor.audit(session.current());

    if json {
        let output = serde_json::json!({
            "score_before": before.health_score,
            "score_after": after.health_score,
            "rows_removed": session.rows_removed(),
            "history": session.history(),
            "report": after,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("CLEANING HISTORY");
    println!("{}\n", "=".repeat(80));
    if session.history().is_empty() {
        println!("  No changes recorded");
    }
    for (i, entry) in session.history().iter().enumerate() {
        println!(
            "  {}. [{}] {} - {} (rows affected: {})",
            i + 1,
            entry.timestamp.format("%H:%M:%S"),
            entry.operation.display_name(),
            entry.details,
            entry.rows_affected
        );
    }
    println!();
    println!(
        "  Health score: {} -> {}   Rows: {} -> {}",
        before.health_score,
        after.health_score,
        session.original().height(),
        session.current().height()
    );
    println!();
    Ok(())
}

/// Merge the optional config file with per-field flags and validate.
fn build_config(input: &InputArgs) -> Result<AuditConfig> {
    let mut config = match &input.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Cannot read config file {}: {}", path, e))?;
            AuditConfig::from_json(&raw)?
        }
        None => AuditConfig::default(),
    };

    if let Some(column) = &input.id_column {
        config.primary_id_column = Some(column.clone());
    }
    if let Some(column) = &input.timestamp_column {
        config.primary_timestamp_column = Some(column.clone());
    }
    if let Some(column) = &input.model_year_column {
        config.model_year_column = Some(column.clone());
    }
    if !input.key_fields.is_empty() {
        config.key_fields = input.key_fields.clone();
    }

    config.validate()?;
    debug!("Audit configuration: {:?}", config);
    Ok(config)
}

fn load_table(path: &str) -> Result<Table> {
    if !std::path::Path::new(path).exists() {
        return Err(anyhow!("Input file not found: {}", path));
    }

    info!("Loading dataset from: {}", path);
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;
    info!("Dataset loaded successfully: {:?}", df.shape());

    let categorical = low_cardinality_text_columns(&df);
    if !categorical.is_empty() {
        debug!("Treating as categorical: {:?}", categorical);
    }
    let table = Table::with_kinds(
        df,
        categorical.into_iter().map(|name| (name, ColumnKind::Categorical)),
    )?;
    Ok(table)
}

fn low_cardinality_text_columns(df: &DataFrame) -> Vec<String> {
    if df.height() == 0 {
        return Vec::new();
    }
    df.get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .filter(|c| {
            let distinct = c
                .as_materialized_series()
                .drop_nulls()
                .n_unique()
                .unwrap_or(usize::MAX);
            (distinct as f64) < df.height() as f64 * CATEGORICAL_RATIO
        })
        .map(|c| c.name().to_string())
        .collect()
}

/// Print the audit report.
///
/// Uses `println!` intentionally for user-facing CLI output, independent
/// of the log level.
fn print_report(path: &str, report: &AuditReport) {
    println!("\n{}", "=".repeat(80));
    println!("DATA QUALITY AUDIT");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", path);
    println!("  Rows: {}", report.shape.rows);
    println!("  Columns: {}", report.shape.columns);
    println!("  Memory: {:.2} MB", report.shape.estimated_size_mb);
    println!("  Health score: {}/100", report.health_score);
    println!();

    println!("FINDINGS");
    println!("{}", "-".repeat(40));
    if report.findings.is_empty() {
        println!("  No issues found");
    }
    for finding in &report.findings {
        println!("  [{}] {}", finding.severity.display_name(), finding.message);
    }
    println!();

    if !report.skipped_checks.is_empty() {
        println!("SKIPPED CHECKS");
        println!("{}", "-".repeat(40));
        for skipped in &report.skipped_checks {
            println!(
                "  {:?} on '{}': {:?}",
                skipped.check, skipped.column, skipped.reason
            );
        }
        println!();
    }

    if report.column_profiles.is_empty() {
        return;
    }

    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));
    println!(
        "{:<24} {:<12} {:<10} {:<10} {:<10} {:<10}",
        "Column", "Kind", "Missing %", "Unique", "Outliers", "Status"
    );
    println!("{}", "-".repeat(80));
    for profile in &report.column_profiles {
        println!(
            "{:<24} {:<12} {:<10.2} {:<10} {:<10} {:<10}",
            truncate_str(&profile.name, 23),
            profile.kind.as_str(),
            profile.missing_percentage,
            profile.distinct_count,
            profile.outlier_count,
            profile.status.display_name()
        );
    }
    println!();
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
