//! Person name alias operations
//!
//! `upsert_alias` is the only write path for aliases. It is one
//! `INSERT … ON CONFLICT DO UPDATE` statement whose SET expressions read the
//! pre-write row, so two imports racing on the same canonical alias cannot
//! lose the anti-downgrade guarantee:
//!
//! - stored `manual_seed` (or no row): identity columns take the incoming
//!   values, evidence columns take `incoming ?? stored`
//! - stored `official_*`, incoming `manual_seed`: identity columns are kept,
//!   evidence columns only fill blanks (`stored ?? incoming`)
//! - stored `official_*`, incoming `official_*`: same as the first case
//!
//! The engine's pure `merge_alias_row` encodes the same table and is tested
//! against this statement.

use crate::db::models::{AliasRow, MANUAL_SEED};
use crate::db::non_blank;
use crate::Result;
use sqlx::SqliteConnection;

/// Predicate (evaluated on the pre-write row) for a blocked downgrade
const DOWNGRADE_BLOCKED: &str = "(person_name_aliases.source_kind <> 'manual_seed' \
     AND excluded.source_kind = 'manual_seed')";

fn identity_column(column: &str) -> String {
    format!(
        "{column} = CASE WHEN {DOWNGRADE_BLOCKED} \
         THEN person_name_aliases.{column} ELSE excluded.{column} END"
    )
}

fn text_evidence_column(column: &str) -> String {
    format!(
        "{column} = CASE WHEN {DOWNGRADE_BLOCKED} \
         THEN COALESCE(NULLIF(person_name_aliases.{column}, ''), excluded.{column}) \
         ELSE COALESCE(excluded.{column}, NULLIF(person_name_aliases.{column}, '')) END"
    )
}

fn value_evidence_column(column: &str) -> String {
    format!(
        "{column} = CASE WHEN {DOWNGRADE_BLOCKED} \
         THEN COALESCE(person_name_aliases.{column}, excluded.{column}) \
         ELSE COALESCE(excluded.{column}, person_name_aliases.{column}) END"
    )
}

fn upsert_sql() -> String {
    let assignments = [
        identity_column("person_id"),
        identity_column("alias"),
        identity_column("source_kind"),
        text_evidence_column("source_url"),
        text_evidence_column("evidence_date"),
        text_evidence_column("evidence_quote"),
        value_evidence_column("source_record_pk"),
        value_evidence_column("confidence"),
        text_evidence_column("note"),
        "updated_at = CURRENT_TIMESTAMP".to_string(),
    ];

    format!(
        r#"
        INSERT INTO person_name_aliases (
            canonical_alias, alias, person_id, source_kind, source_url,
            evidence_date, evidence_quote, source_record_pk, confidence, note
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(canonical_alias) DO UPDATE SET
            {}
        "#,
        assignments.join(",\n            ")
    )
}

/// Atomic conditional upsert of an alias row
///
/// Blank text values are written as NULL. `source_kind` must already be
/// normalized (`manual_seed` or `official_*`).
pub async fn upsert_alias(conn: &mut SqliteConnection, row: &AliasRow) -> Result<()> {
    sqlx::query(&upsert_sql())
        .bind(&row.canonical_alias)
        .bind(&row.alias)
        .bind(row.person_id)
        .bind(&row.source_kind)
        .bind(non_blank(&row.source_url))
        .bind(non_blank(&row.evidence_date))
        .bind(non_blank(&row.evidence_quote))
        .bind(row.source_record_pk)
        .bind(row.confidence)
        .bind(non_blank(&row.note))
        .execute(&mut *conn)
        .await?;

    Ok(())
}

const SELECT_ALIAS: &str = r#"
    SELECT canonical_alias, alias, person_id, source_kind, source_url,
           evidence_date, evidence_quote, source_record_pk, confidence, note
    FROM person_name_aliases
"#;

/// Load alias by canonical alias
pub async fn get_alias(
    conn: &mut SqliteConnection,
    canonical_alias: &str,
) -> Result<Option<AliasRow>> {
    let sql = format!("{SELECT_ALIAS} WHERE canonical_alias = ?");
    let row = sqlx::query_as::<_, AliasRow>(&sql)
        .bind(canonical_alias)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row)
}

/// Load all aliases ordered by canonical alias
pub async fn list_aliases(conn: &mut SqliteConnection) -> Result<Vec<AliasRow>> {
    let sql = format!("{SELECT_ALIAS} ORDER BY canonical_alias");
    let rows = sqlx::query_as::<_, AliasRow>(&sql)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Alias totals: (all, manual_seed, official)
pub async fn count_aliases_by_kind(conn: &mut SqliteConnection) -> Result<(i64, i64, i64)> {
    let (total, manual): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN source_kind = ? THEN 1 ELSE 0 END), 0)
        FROM person_name_aliases
        "#,
    )
    .bind(MANUAL_SEED)
    .fetch_one(&mut *conn)
    .await?;

    Ok((total, manual, total - manual))
}
