//! Person registry operations

use crate::db::models::PersonRow;
use crate::Result;
use sqlx::SqliteConnection;

/// Insert a person and return its `person_id`
///
/// `full_name_key` is the caller's normalized lookup key for `full_name`.
pub async fn insert_person(
    conn: &mut SqliteConnection,
    full_name: &str,
    full_name_key: &str,
    canonical_key: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO persons (full_name, full_name_key, canonical_key)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(full_name)
    .bind(full_name_key)
    .bind(canonical_key)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load person by id
pub async fn get_person(conn: &mut SqliteConnection, person_id: i64) -> Result<Option<PersonRow>> {
    let row = sqlx::query_as::<_, PersonRow>(
        "SELECT person_id, full_name, full_name_key, canonical_key FROM persons WHERE person_id = ?",
    )
    .bind(person_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Load person by canonical key
pub async fn get_person_by_canonical_key(
    conn: &mut SqliteConnection,
    canonical_key: &str,
) -> Result<Option<PersonRow>> {
    let row = sqlx::query_as::<_, PersonRow>(
        "SELECT person_id, full_name, full_name_key, canonical_key FROM persons WHERE canonical_key = ?",
    )
    .bind(canonical_key)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Exact lookup on the normalized full name (lowest `person_id` wins)
pub async fn find_person_by_full_name_key(
    conn: &mut SqliteConnection,
    full_name_key: &str,
) -> Result<Option<PersonRow>> {
    let row = sqlx::query_as::<_, PersonRow>(
        r#"
        SELECT person_id, full_name, full_name_key, canonical_key
        FROM persons
        WHERE full_name_key = ?
        ORDER BY person_id
        LIMIT 1
        "#,
    )
    .bind(full_name_key)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Load all persons ordered by id
pub async fn list_persons(conn: &mut SqliteConnection) -> Result<Vec<PersonRow>> {
    let rows = sqlx::query_as::<_, PersonRow>(
        "SELECT person_id, full_name, full_name_key, canonical_key FROM persons ORDER BY person_id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn count_persons(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM persons")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use sqlx::Connection;

    async fn memory_conn() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        init_schema(&mut conn).await.expect("Schema initialization failed");
        conn
    }

    #[tokio::test]
    async fn test_insert_and_lookup_person() {
        let mut conn = memory_conn().await;

        let id = insert_person(&mut conn, "Ana  García", "ana garcía", "manual::abc")
            .await
            .unwrap();

        let by_id = get_person(&mut conn, id).await.unwrap().expect("person");
        assert_eq!(by_id.full_name, "Ana  García");

        let by_key = get_person_by_canonical_key(&mut conn, "manual::abc")
            .await
            .unwrap()
            .expect("person");
        assert_eq!(by_key.person_id, id);

        let by_name = find_person_by_full_name_key(&mut conn, "ana garcía")
            .await
            .unwrap()
            .expect("person");
        assert_eq!(by_name.person_id, id);

        assert!(get_person(&mut conn, id + 100).await.unwrap().is_none());
        assert_eq!(count_persons(&mut conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_full_name_lookup_prefers_lowest_id() {
        let mut conn = memory_conn().await;

        let first = insert_person(&mut conn, "Luis Pérez", "luis pérez", "k1").await.unwrap();
        insert_person(&mut conn, "LUIS PÉREZ", "luis pérez", "k2").await.unwrap();

        let found = find_person_by_full_name_key(&mut conn, "luis pérez")
            .await
            .unwrap()
            .expect("person");
        assert_eq!(found.person_id, first);
        assert_eq!(list_persons(&mut conn).await.unwrap().len(), 2);
    }
}
