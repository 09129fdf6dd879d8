use crate::auth::repo_types::{Session, User};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

// ---- Users ----

pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, image_file
        FROM users
        WHERE email = ?1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_by_username(db: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, image_file
        FROM users
        WHERE username = ?1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, image_file
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Insert a user; a taken username or email surfaces as a unique violation.
pub async fn create(
    db: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password)
        VALUES (?1, ?2, ?3)
        RETURNING id, username, email, password, image_file
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(db)
    .await
}

pub async fn update_profile(
    db: &SqlitePool,
    id: i64,
    username: &str,
    email: &str,
    image_file: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
           SET username = ?2, email = ?3, image_file = ?4
         WHERE id = ?1
        RETURNING id, username, email, password, image_file
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(image_file)
    .fetch_one(db)
    .await
}

// ---- Sessions ----

pub async fn create_session(
    db: &SqlitePool,
    user_id: i64,
    remember: bool,
    expires_at: OffsetDateTime,
) -> sqlx::Result<Session> {
    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (id, user_id, remember, created_at, expires_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id, user_id, remember, created_at, expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(remember)
    .bind(OffsetDateTime::now_utc())
    .bind(expires_at)
    .fetch_one(db)
    .await
}

pub async fn find_session(db: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Session>> {
    sqlx::query_as::<_, Session>(
        r#"
        SELECT id, user_id, remember, created_at, expires_at
        FROM sessions
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn delete_session(db: &SqlitePool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Removes every session whose expiry has passed; returns how many went.
pub async fn purge_expired_sessions(db: &SqlitePool, now: OffsetDateTime) -> sqlx::Result<u64> {
    let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(now)
        .execute(db)
        .await?;
    Ok(done.rows_affected())
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
    async fn create_and_find_user() {
        let db = pool().await;
        let user = create(&db, "alice", "a@x.com", "hash").await.unwrap();
        assert_eq!(user.image_file, "default.jpg");

        let by_email = find_by_email(&db, "a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_name = find_by_username(&db, "alice").await.unwrap().unwrap();
        assert_eq!(by_name.email, "a@x.com");
        assert!(find_by_id(&db, user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_unique_violation() {
        let db = pool().await;
        create(&db, "alice", "a@x.com", "hash").await.unwrap();
        let err = create(&db, "bob", "a@x.com", "hash").await.unwrap_err();
        let db_err = err.as_database_error().expect("database error");
        assert!(db_err.is_unique_violation());
        assert!(db_err.message().contains("users.email"));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let db = pool().await;
        let user = create(&db, "alice", "a@x.com", "hash").await.unwrap();
        let expires = OffsetDateTime::now_utc() + time::Duration::hours(1);
        let session = create_session(&db, user.id, true, expires).await.unwrap();

        let found = find_session(&db, session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, user.id);
        assert!(found.remember);
        assert!(found.is_live(OffsetDateTime::now_utc()));

        delete_session(&db, session.id).await.unwrap();
        assert!(find_session(&db, session.id).await.unwrap().is_none());
    }
}
