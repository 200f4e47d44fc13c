//! Responsibility edges and per-fragment IRLC scores
//!
//! Edges are immutable facts written by upstream importers; the scoring core
//! only reads them. Insert helpers exist for those importers and for fixtures.

use crate::db::models::{DirectEdgeRow, IndirectEdgeRow};
use crate::db::non_blank;
use crate::Result;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

/// Insert a direct edge and return its `edge_id` (the row's `edge_id` is ignored)
pub async fn insert_direct_edge(conn: &mut SqliteConnection, edge: &DirectEdgeRow) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO responsibility_edges (
            fragment_id, role, actor_label, person_id,
            source_url, evidence_date, evidence_quote
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&edge.fragment_id)
    .bind(&edge.role)
    .bind(&edge.actor_label)
    .bind(edge.person_id)
    .bind(non_blank(&edge.source_url))
    .bind(non_blank(&edge.evidence_date))
    .bind(non_blank(&edge.evidence_quote))
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert an indirect edge and return its `edge_id`
pub async fn insert_indirect_edge(
    conn: &mut SqliteConnection,
    edge: &IndirectEdgeRow,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO indirect_responsibility_edges (
            fragment_id, role, actor_label, actor_person_name, actor_role_title,
            appointment_start_date, appointment_end_date, causal_distance,
            edge_confidence, evidence_date, evidence_quote, source_url
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&edge.fragment_id)
    .bind(&edge.role)
    .bind(&edge.actor_label)
    .bind(non_blank(&edge.actor_person_name))
    .bind(non_blank(&edge.actor_role_title))
    .bind(non_blank(&edge.appointment_start_date))
    .bind(non_blank(&edge.appointment_end_date))
    .bind(edge.causal_distance)
    .bind(edge.edge_confidence)
    .bind(non_blank(&edge.evidence_date))
    .bind(non_blank(&edge.evidence_quote))
    .bind(non_blank(&edge.source_url))
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load all direct edges ordered by id
pub async fn list_direct_edges(conn: &mut SqliteConnection) -> Result<Vec<DirectEdgeRow>> {
    let rows = sqlx::query_as::<_, DirectEdgeRow>(
        r#"
        SELECT edge_id, fragment_id, role, actor_label, person_id,
               source_url, evidence_date, evidence_quote
        FROM responsibility_edges
        ORDER BY edge_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Load all indirect edges ordered by id
pub async fn list_indirect_edges(conn: &mut SqliteConnection) -> Result<Vec<IndirectEdgeRow>> {
    let rows = sqlx::query_as::<_, IndirectEdgeRow>(
        r#"
        SELECT edge_id, fragment_id, role, actor_label, actor_person_name,
               actor_role_title, appointment_start_date, appointment_end_date,
               causal_distance, edge_confidence, evidence_date, evidence_quote,
               source_url
        FROM indirect_responsibility_edges
        ORDER BY edge_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Set the IRLC score of a fragment
pub async fn upsert_fragment_score(
    conn: &mut SqliteConnection,
    fragment_id: &str,
    irlc_score: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO fragment_scores (fragment_id, irlc_score)
        VALUES (?, ?)
        ON CONFLICT(fragment_id) DO UPDATE SET irlc_score = excluded.irlc_score
        "#,
    )
    .bind(fragment_id)
    .bind(irlc_score)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load the per-fragment IRLC score lookup
pub async fn load_fragment_scores(conn: &mut SqliteConnection) -> Result<HashMap<String, f64>> {
    let rows = sqlx::query("SELECT fragment_id, irlc_score FROM fragment_scores")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>("fragment_id"), row.get::<f64, _>("irlc_score")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use sqlx::Connection;

    #[tokio::test]
    async fn test_edges_roundtrip_through_storage() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        init_schema(&mut conn).await.unwrap();

        let direct = DirectEdgeRow {
            fragment_id: "boe-a-2020-1:art1".to_string(),
            role: "approve".to_string(),
            actor_label: "Consejo de Ministros".to_string(),
            source_url: Some("".to_string()),
            ..Default::default()
        };
        let id = insert_direct_edge(&mut conn, &direct).await.unwrap();

        let indirect = IndirectEdgeRow {
            fragment_id: "boe-a-2020-1:art1".to_string(),
            role: "propose".to_string(),
            actor_person_name: Some("Ana García".to_string()),
            causal_distance: 2,
            edge_confidence: 0.7,
            ..Default::default()
        };
        insert_indirect_edge(&mut conn, &indirect).await.unwrap();
        upsert_fragment_score(&mut conn, "boe-a-2020-1:art1", 3.5).await.unwrap();
        upsert_fragment_score(&mut conn, "boe-a-2020-1:art1", 4.0).await.unwrap();

        let directs = list_direct_edges(&mut conn).await.unwrap();
        assert_eq!(directs.len(), 1);
        assert_eq!(directs[0].edge_id, id);
        assert!(directs[0].source_url.is_none());

        let indirects = list_indirect_edges(&mut conn).await.unwrap();
        assert_eq!(indirects[0].causal_distance, 2);
        assert_eq!(indirects[0].actor_person_name.as_deref(), Some("Ana García"));

        let scores = load_fragment_scores(&mut conn).await.unwrap();
        assert_eq!(scores.get("boe-a-2020-1:art1"), Some(&4.0));
    }
}
