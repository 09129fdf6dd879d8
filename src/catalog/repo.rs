use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::catalog::repo_types::{ImageDetails, IndexEntry};

pub async fn list(db: &SqlitePool) -> sqlx::Result<Vec<ImageDetails>> {
    sqlx::query_as::<_, ImageDetails>(
        "SELECT id, name, url, description FROM image_details ORDER BY id",
    )
    .fetch_all(db)
    .await
}

pub async fn list_index(db: &SqlitePool) -> sqlx::Result<Vec<IndexEntry>> {
    sqlx::query_as::<_, IndexEntry>("SELECT id, name FROM image_index ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn find(db: &SqlitePool, id: i64) -> sqlx::Result<Option<ImageDetails>> {
    sqlx::query_as::<_, ImageDetails>(
        "SELECT id, name, url, description FROM image_details WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Exact name match against the index, resolved to full details.
pub async fn search_by_name(db: &SqlitePool, name: &str) -> sqlx::Result<Vec<ImageDetails>> {
    sqlx::query_as::<_, ImageDetails>(
        r#"
        SELECT d.id, d.name, d.url, d.description
          FROM image_index i
          JOIN image_details d ON d.id = i.id
         WHERE i.name = ?1
         ORDER BY i.id
        "#,
    )
    .bind(name)
    .fetch_all(db)
    .await
}

async fn insert_details_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    url: &str,
    description: &str,
) -> sqlx::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO image_details (name, url, description)
        VALUES (?1, ?2, ?3)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(url)
    .bind(description)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn upsert_index_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    name: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO image_index (id, name) VALUES (?1, ?2)
        ON CONFLICT (id) DO UPDATE SET name = excluded.name
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert(
    db: &SqlitePool,
    name: &str,
    url: &str,
    description: &str,
) -> sqlx::Result<i64> {
    let mut tx = db.begin().await?;
    let id = insert_details_tx(&mut tx, name, url, description).await?;
    upsert_index_tx(&mut tx, id, name).await?;
    tx.commit().await?;
    Ok(id)
}

/// Returns false when no row has `id`.
pub async fn update(
    db: &SqlitePool,
    id: i64,
    name: &str,
    url: &str,
    description: &str,
) -> sqlx::Result<bool> {
    let mut tx = db.begin().await?;
    let done = sqlx::query(
        "UPDATE image_details SET name = ?2, url = ?3, description = ?4 WHERE id = ?1",
    )
    .bind(id)
    .bind(name)
    .bind(url)
    .bind(description)
    .execute(&mut *tx)
    .await?;
    if done.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }
    upsert_index_tx(&mut tx, id, name).await?;
    tx.commit().await?;
    Ok(true)
}

/// Returns false when no row has `id`.
pub async fn delete(db: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM image_index WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let done = sqlx::query("DELETE FROM image_details WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(done.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn pool() -> SqlitePool {
        let db = db::connect_in_memory().await.unwrap();
        db::migrate(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn insert_writes_both_tables() {
        let db = pool().await;
        let id = insert(&db, "cat", "http://x/cat.png", "a cat").await.unwrap();

        assert_eq!(find(&db, id).await.unwrap().unwrap().name, "cat");
        assert_eq!(
            list_index(&db).await.unwrap(),
            vec![IndexEntry { id, name: "cat".into() }]
        );
    }

    #[tokio::test]
    async fn search_is_exact() {
        let db = pool().await;
        let a = insert(&db, "cat", "u1", "d1").await.unwrap();
        insert(&db, "dog", "u2", "d2").await.unwrap();
        let c = insert(&db, "cat", "u3", "d3").await.unwrap();

        let hits: Vec<i64> = search_by_name(&db, "cat").await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(hits, vec![a, c]);
        assert!(search_by_name(&db, "Cat").await.unwrap().is_empty());
        assert!(search_by_name(&db, "ca").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_renames_the_index_too() {
        let db = pool().await;
        let id = insert(&db, "cat", "u", "d").await.unwrap();

        assert!(update(&db, id, "lion", "u2", "d2").await.unwrap());
        assert_eq!(search_by_name(&db, "lion").await.unwrap()[0].url, "u2");
        assert!(search_by_name(&db, "cat").await.unwrap().is_empty());

        assert!(!update(&db, id + 1, "x", "x", "x").await.unwrap());
        assert!(list_index(&db).await.unwrap().iter().all(|e| e.id == id));
    }

    #[tokio::test]
    async fn delete_removes_both_rows() {
        let db = pool().await;
        let id = insert(&db, "cat", "u", "d").await.unwrap();

        assert!(delete(&db, id).await.unwrap());
        assert!(find(&db, id).await.unwrap().is_none());
        assert!(list_index(&db).await.unwrap().is_empty());
        assert!(!delete(&db, id).await.unwrap());
    }
}
