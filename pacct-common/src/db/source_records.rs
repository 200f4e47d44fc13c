//! Source-record cross-reference lookup, keyed by (source_id, source_record_id)

use crate::db::models::SourceRecordRow;
use crate::Result;
use sqlx::SqliteConnection;

/// Register a source record (idempotent) and return its primary key
pub async fn ensure_source_record(
    conn: &mut SqliteConnection,
    source_id: &str,
    source_record_id: &str,
) -> Result<i64> {
    sqlx::query(
        "INSERT OR IGNORE INTO source_records (source_id, source_record_id) VALUES (?, ?)",
    )
    .bind(source_id)
    .bind(source_record_id)
    .execute(&mut *conn)
    .await?;

    let pk: i64 = sqlx::query_scalar(
        "SELECT source_record_pk FROM source_records WHERE source_id = ? AND source_record_id = ?",
    )
    .bind(source_id)
    .bind(source_record_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(pk)
}

/// Look up the primary key for (source_id, source_record_id)
pub async fn find_source_record_pk(
    conn: &mut SqliteConnection,
    source_id: &str,
    source_record_id: &str,
) -> Result<Option<i64>> {
    let pk = sqlx::query_scalar(
        "SELECT source_record_pk FROM source_records WHERE source_id = ? AND source_record_id = ?",
    )
    .bind(source_id)
    .bind(source_record_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(pk)
}

/// Load every source record ordered by primary key
pub async fn list_source_records(conn: &mut SqliteConnection) -> Result<Vec<SourceRecordRow>> {
    let rows = sqlx::query_as::<_, SourceRecordRow>(
        "SELECT source_record_pk, source_id, source_record_id FROM source_records ORDER BY source_record_pk",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use sqlx::Connection;

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        init_schema(&mut conn).await.unwrap();

        let a = ensure_source_record(&mut conn, "boe", "BOE-A-2020-410").await.unwrap();
        let b = ensure_source_record(&mut conn, "boe", "BOE-A-2020-410").await.unwrap();
        assert_eq!(a, b);

        assert_eq!(
            find_source_record_pk(&mut conn, "boe", "BOE-A-2020-410").await.unwrap(),
            Some(a)
        );
        assert_eq!(find_source_record_pk(&mut conn, "boe", "missing").await.unwrap(), None);
        assert_eq!(list_source_records(&mut conn).await.unwrap().len(), 1);
    }
}
