//! pacct - personal accountability toolchain entry point
//!
//! One process, one SQLite connection, one unit of work. Every command
//! prints a single JSON report on stdout; logs go to stderr.
//!
//! Exit codes: 0 ok/degraded, 1 failed status or fatal error, 2 gate not
//! passed under `--enforce-gate`. Unreadable or invalid seed and decision
//! files still produce a `failed` report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pacct_common::config::{resolve_database_path, TomlConfig};
use pacct_common::db::{init::SCHEMA_VERSION, init_database};
use pacct_engine::config::{parse_threshold, ScoringSettings};
use pacct_engine::io::{read_json, read_table, write_json, write_table, TableFormat};
use pacct_engine::models::RoleWeights;
use pacct_engine::run::{build_queue, evaluate_store};
use pacct_engine::scoring::RunStatus;
use pacct_engine::workflow::{
    apply_review, import_seed, load_seed_document, ImportOptions, ImportReport, ReviewReport,
    SourceRecordLookup,
};

/// Command-line arguments for pacct
#[derive(Parser, Debug)]
#[command(name = "pacct")]
#[command(about = "Personal accountability identity resolution and scoring")]
#[command(version)]
struct Args {
    /// SQLite database file (overrides PACCT_DATABASE and the config file)
    #[arg(long, global = true, value_name = "FILE")]
    database: Option<PathBuf>,

    /// TOML config file (overrides PACCT_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and schema
    InitDb,

    /// Import a seed document of alias mappings
    ImportSeed {
        #[arg(long, value_name = "FILE")]
        seed: PathBuf,

        /// Run every write inside the transaction, then roll back
        #[arg(long)]
        dry_run: bool,
    },

    /// Compute personal responsibility scores and coverage gate
    Score {
        #[arg(long)]
        confidence_min: Option<f64>,

        #[arg(long)]
        max_causal_distance: Option<i64>,

        /// Persons listed in top_person_scores
        #[arg(long)]
        top_n: Option<usize>,

        /// Gate threshold override, repeatable
        #[arg(long = "threshold", value_name = "NAME=VALUE", value_parser = parse_threshold)]
        thresholds: Vec<(String, f64)>,

        /// Exit with code 2 when the gate does not pass
        #[arg(long)]
        enforce_gate: bool,

        /// Also write the report to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Build backlogs and write the review queue
    Queue {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Queue file format (default: from the file extension)
        #[arg(long, value_enum)]
        format: Option<TableFormat>,

        /// Also write the backlog report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Apply reviewer decisions to a seed document
    ApplyReview {
        /// Decision feed (CSV or JSON)
        #[arg(long, value_name = "FILE")]
        decisions: PathBuf,

        /// Current seed document
        #[arg(long, value_name = "FILE")]
        seed: PathBuf,

        /// Where to write the updated seed
        #[arg(long, value_name = "FILE")]
        out_seed: PathBuf,

        /// Source-record lookup (CSV or JSON); defaults to the database
        #[arg(long, value_name = "FILE")]
        source_records: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let toml = TomlConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(args.log_level.as_deref(), &toml.logging.level);

    let db_path = resolve_database_path(args.database.as_deref(), &toml);

    match args.command {
        Command::InitDb => {
            open_store(&db_path).await?;
            emit(&InitReport {
                status: RunStatus::Ok,
                database: db_path.display().to_string(),
                schema_version: SCHEMA_VERSION,
            })?;
            Ok(ExitCode::SUCCESS)
        }

        Command::ImportSeed { seed, dry_run } => {
            let raw = match read_json(&seed) {
                Ok(raw) => raw,
                Err(e) => {
                    error!(path = %seed.display(), error = %e, "Seed unreadable");
                    emit(&ImportReport::rejected(e.into_messages(), dry_run))?;
                    return Ok(ExitCode::from(1));
                }
            };
            let pool = open_store(&db_path).await?;
            let report = import_seed(&pool, &raw, ImportOptions { dry_run })
                .await
                .context("Seed import failed")?;
            emit(&report)?;
            Ok(status_exit(report.status))
        }

        Command::Score {
            confidence_min,
            max_causal_distance,
            top_n,
            thresholds,
            enforce_gate,
            out,
        } => {
            let mut settings = ScoringSettings::from_toml(&toml);
            if let Some(value) = confidence_min {
                settings.filter.confidence_min = value;
            }
            if let Some(value) = max_causal_distance {
                settings.filter.max_causal_distance = value;
            }
            if let Some(value) = top_n {
                settings.top_n = value;
            }
            for (name, value) in &thresholds {
                settings.set_threshold(name, *value);
            }

            let weights = RoleWeights::standard();
            let pool = open_store(&db_path).await?;
            let mut conn = pool.acquire().await?;
            let evaluation = evaluate_store(&mut *conn, &settings, &weights).await?;
            let report = evaluation.report(&settings, &weights, Utc::now());

            if let Some(path) = &out {
                write_json(path, &report)?;
            }
            emit(&report)?;

            info!(
                status = report.status.as_str(),
                gate_passed = report.gate.passed,
                persons = report.totals.scoring.persons_scored_total,
                "Scoring finished"
            );

            if report.status == RunStatus::Failed {
                Ok(ExitCode::from(1))
            } else if enforce_gate && !report.gate.passed {
                Ok(ExitCode::from(2))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }

        Command::Queue { out, format, report } => {
            let settings = ScoringSettings::from_toml(&toml);
            let weights = RoleWeights::standard();
            let pool = open_store(&db_path).await?;
            let mut conn = pool.acquire().await?;
            let evaluation = evaluate_store(&mut *conn, &settings, &weights).await?;

            let (queue_report, rows) = build_queue(&evaluation, Utc::now());
            let format = format.unwrap_or_else(|| TableFormat::from_path(&out));
            write_table(&out, format, &rows)?;
            if let Some(path) = &report {
                write_json(path, &queue_report)?;
            }
            emit(&queue_report)?;
            Ok(status_exit(queue_report.status))
        }

        Command::ApplyReview {
            decisions,
            seed,
            out_seed,
            source_records,
            report,
        } => {
            let inputs = load_seed_document(&seed)
                .and_then(|current| Ok((current, read_table(&decisions)?)));
            let (current, rows) = match inputs {
                Ok(inputs) => inputs,
                Err(e) => {
                    error!(error = %e, "Review inputs rejected");
                    let rejected = ReviewReport::rejected(e.into_messages());
                    if let Some(path) = &report {
                        write_json(path, &rejected)?;
                    }
                    emit(&rejected)?;
                    return Ok(ExitCode::from(1));
                }
            };

            let lookup = match &source_records {
                Some(path) => SourceRecordLookup::from_rows(&read_table(path)?),
                None => {
                    let pool = open_store(&db_path).await?;
                    let mut conn = pool.acquire().await?;
                    SourceRecordLookup::load(&mut *conn).await?
                }
            };
            info!(entries = lookup.len(), "Source record lookup ready");

            let applied = apply_review(current, &rows, &lookup);
            write_json(&out_seed, &applied.seed)?;
            if let Some(path) = &report {
                write_json(path, &applied.report)?;
            }
            emit(&applied.report)?;
            Ok(status_exit(applied.report.status))
        }
    }
}

#[derive(Serialize)]
struct InitReport {
    status: RunStatus,
    database: String,
    schema_version: i64,
}

/// Filter priority: RUST_LOG → --log-level → [logging].level → info
fn init_tracing(cli_level: Option<&str>, toml_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli_level.unwrap_or(toml_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_store(path: &Path) -> Result<SqlitePool> {
    init_database(path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

fn emit<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn status_exit(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Failed => ExitCode::from(1),
        RunStatus::Ok | RunStatus::Degraded => ExitCode::SUCCESS,
    }
}
