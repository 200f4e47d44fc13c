//! Test Helper Utilities
//!
//! Temporary stores and fixture rows shared by the engine integration tests

#![allow(dead_code)]

use anyhow::Result;
use pacct_common::db::{edges, init_database, persons, source_records, DirectEdgeRow, IndirectEdgeRow};
use pacct_engine::identity::{canonical_alias, manual_canonical_key};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a temporary store with the schema applied
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let pool = init_database(&temp_dir.path().join("test_pacct.db")).await?;
    Ok((temp_dir, pool))
}

pub async fn add_person(pool: &SqlitePool, full_name: &str) -> Result<i64> {
    let mut conn = pool.acquire().await?;
    let person_id = persons::insert_person(
        &mut *conn,
        full_name,
        &canonical_alias(full_name),
        &manual_canonical_key(full_name),
    )
    .await?;
    Ok(person_id)
}

pub async fn add_source_record(pool: &SqlitePool, source_id: &str, record_id: &str) -> Result<i64> {
    let mut conn = pool.acquire().await?;
    Ok(source_records::ensure_source_record(&mut *conn, source_id, record_id).await?)
}

pub async fn set_irlc(pool: &SqlitePool, fragment_id: &str, score: f64) -> Result<()> {
    let mut conn = pool.acquire().await?;
    edges::upsert_fragment_score(&mut *conn, fragment_id, score).await?;
    Ok(())
}

/// Direct edge bound to a person; `primary` fills url, date and quote
pub async fn add_direct_edge(
    pool: &SqlitePool,
    fragment_id: &str,
    role: &str,
    person_id: Option<i64>,
    actor_label: &str,
    primary: bool,
) -> Result<i64> {
    let mut conn = pool.acquire().await?;
    let row = DirectEdgeRow {
        fragment_id: fragment_id.to_string(),
        role: role.to_string(),
        actor_label: actor_label.to_string(),
        person_id,
        source_url: Some("https://boe.es/diario".to_string()),
        evidence_date: primary.then(|| "2020-02-01".to_string()),
        evidence_quote: primary.then(|| "Se aprueba".to_string()),
        ..Default::default()
    };
    Ok(edges::insert_direct_edge(&mut *conn, &row).await?)
}

/// Indirect edge with primary evidence, appointed 2018-01-01 with no end
pub fn indirect_row(fragment_id: &str, role: &str, person_name: &str, evidence_date: &str) -> IndirectEdgeRow {
    IndirectEdgeRow {
        fragment_id: fragment_id.to_string(),
        role: role.to_string(),
        actor_label: "Ministerio de Hacienda".to_string(),
        actor_person_name: Some(person_name.to_string()),
        actor_role_title: Some("Ministro".to_string()),
        appointment_start_date: Some("2018-01-01".to_string()),
        appointment_end_date: None,
        causal_distance: 1,
        edge_confidence: 1.0,
        evidence_date: Some(evidence_date.to_string()),
        evidence_quote: Some("Por delegación".to_string()),
        source_url: Some("https://boe.es/diario".to_string()),
        ..Default::default()
    }
}

pub async fn add_indirect_edge(pool: &SqlitePool, row: &IndirectEdgeRow) -> Result<i64> {
    let mut conn = pool.acquire().await?;
    Ok(edges::insert_indirect_edge(&mut *conn, row).await?)
}

pub fn seed(mappings: Vec<Value>) -> Value {
    json!({
        "schema_version": "1",
        "methodology": {"source": "BOE"},
        "mappings": mappings,
    })
}

pub fn manual_mapping(alias: &str, full_name: &str) -> Value {
    json!({
        "actor_person_name": alias,
        "person_full_name": full_name,
        "source_kind": "manual_seed",
        "confidence": 0.6,
    })
}

pub fn official_mapping(alias: &str, full_name: &str) -> Value {
    json!({
        "actor_person_name": alias,
        "person_full_name": full_name,
        "source_kind": "official_nombramiento",
        "source_url": "https://boe.es/nombramiento",
        "evidence_date": "2018-06-07",
        "evidence_quote": "Vengo en nombrar",
        "confidence": 1.0,
    })
}
