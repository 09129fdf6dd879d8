use sqlx::SqlitePool;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

use crate::posts::repo_types::PostRow;

const SELECT_POST: &str = r#"
    SELECT p.id, p.title, p.content, p.date_posted, p.author_id,
           u.username AS author_username, u.image_file AS author_image_file
      FROM posts p
      JOIN users u ON u.id = p.author_id
"#;

/// RFC 3339 with fixed-width microseconds so text order is time order.
fn timestamp(at: OffsetDateTime) -> sqlx::Result<String> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
        ))
        .map_err(|e| sqlx::Error::Protocol(e.to_string()))
}

pub async fn insert(
    db: &SqlitePool,
    author_id: i64,
    title: &str,
    content: &str,
) -> sqlx::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts (title, content, date_posted, author_id)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(timestamp(OffsetDateTime::now_utc())?)
    .bind(author_id)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn find(db: &SqlitePool, id: i64) -> sqlx::Result<Option<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!("{SELECT_POST} WHERE p.id = ?1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn update(db: &SqlitePool, id: i64, title: &str, content: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE posts SET title = ?2, content = ?3 WHERE id = ?1")
        .bind(id)
        .bind(title)
        .bind(content)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Newest first; ties on `date_posted` go to the higher id.
pub async fn list_page(db: &SqlitePool, limit: i64, offset: i64) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!(
        "{SELECT_POST} ORDER BY p.date_posted DESC, p.id DESC LIMIT ?1 OFFSET ?2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count(db: &SqlitePool) -> sqlx::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn list_page_by_author(
    db: &SqlitePool,
    author_id: i64,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(&format!(
        "{SELECT_POST} WHERE p.author_id = ?1 ORDER BY p.date_posted DESC, p.id DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(author_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_by_author(db: &SqlitePool, author_id: i64) -> sqlx::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE author_id = ?1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(n)
}
