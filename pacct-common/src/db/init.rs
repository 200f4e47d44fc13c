//! Database initialization
//!
//! Opens (or creates) the SQLite file and creates every table idempotently.
//! The toolchain is a single-process batch tool, so the pool holds exactly one
//! connection.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Current schema version written to `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Applied on every connection the pool opens
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets report runs read while an import holds the write lock
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    let mut conn = pool.acquire().await?;
    init_schema(&mut conn).await?;
    drop(conn);

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn init_schema(conn: &mut SqliteConnection) -> Result<()> {
    create_schema_version_table(conn).await?;
    create_persons_table(conn).await?;
    create_person_name_aliases_table(conn).await?;
    create_responsibility_edges_table(conn).await?;
    create_indirect_responsibility_edges_table(conn).await?;
    create_fragment_scores_table(conn).await?;
    create_source_records_table(conn).await?;
    Ok(())
}

async fn create_schema_version_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn create_persons_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            person_id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            full_name_key TEXT NOT NULL,
            canonical_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_persons_full_name_key ON persons(full_name_key)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_person_name_aliases_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person_name_aliases (
            canonical_alias TEXT PRIMARY KEY,
            alias TEXT NOT NULL,
            person_id INTEGER NOT NULL REFERENCES persons(person_id),
            source_kind TEXT NOT NULL,
            source_url TEXT,
            evidence_date TEXT,
            evidence_quote TEXT,
            source_record_pk INTEGER,
            confidence REAL,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_person_name_aliases_person ON person_name_aliases(person_id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_responsibility_edges_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responsibility_edges (
            edge_id INTEGER PRIMARY KEY AUTOINCREMENT,
            fragment_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '',
            actor_label TEXT NOT NULL DEFAULT '',
            person_id INTEGER,
            source_url TEXT,
            evidence_date TEXT,
            evidence_quote TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_responsibility_edges_fragment ON responsibility_edges(fragment_id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_indirect_responsibility_edges_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS indirect_responsibility_edges (
            edge_id INTEGER PRIMARY KEY AUTOINCREMENT,
            fragment_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '',
            actor_label TEXT NOT NULL DEFAULT '',
            actor_person_name TEXT,
            actor_role_title TEXT,
            appointment_start_date TEXT,
            appointment_end_date TEXT,
            causal_distance INTEGER NOT NULL DEFAULT 1,
            edge_confidence REAL NOT NULL DEFAULT 1.0,
            evidence_date TEXT,
            evidence_quote TEXT,
            source_url TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_indirect_edges_fragment ON indirect_responsibility_edges(fragment_id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_fragment_scores_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fragment_scores (
            fragment_id TEXT PRIMARY KEY,
            irlc_score REAL NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_source_records_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS source_records (
            source_record_pk INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id TEXT NOT NULL,
            source_record_id TEXT NOT NULL,
            UNIQUE (source_id, source_record_id)
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}
