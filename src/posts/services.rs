use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    auth::{repo as users, repo_types::User},
    error::{AppError, AppResult},
    forms::{self, FormErrors, SubmitError},
    posts::{
        dto::{Paginated, PostForm, POSTS_PER_PAGE},
        repo,
        repo_types::PostRow,
    },
};

pub fn validate(form: &PostForm) -> FormErrors {
    let mut errors = FormErrors::new();
    if forms::required(&mut errors, "title", &form.title) {
        forms::max_length(&mut errors, "title", &form.title, 100);
    }
    forms::required(&mut errors, "content", &form.content);
    errors
}

/// Row offset for a 1-based page; pages past the end (other than the first) do not exist.
pub fn page_offset(page: i64, total: i64) -> AppResult<i64> {
    if page < 1 {
        return Err(AppError::NotFound);
    }
    let offset = (page - 1)
        .checked_mul(POSTS_PER_PAGE)
        .ok_or(AppError::NotFound)?;
    if page > 1 && offset >= total {
        return Err(AppError::NotFound);
    }
    Ok(offset)
}

pub async fn create(db: &SqlitePool, author_id: i64, form: &PostForm) -> Result<i64, SubmitError> {
    validate(form).into_result()?;
    let id = repo::insert(db, author_id, &form.title, &form.content).await?;
    info!(post_id = id, author_id, "post created");
    Ok(id)
}

pub async fn get(db: &SqlitePool, id: i64) -> AppResult<PostRow> {
    repo::find(db, id).await?.ok_or(AppError::NotFound)
}

/// The post, provided `user_id` wrote it.
pub async fn owned(db: &SqlitePool, id: i64, user_id: i64) -> AppResult<PostRow> {
    let post = get(db, id).await?;
    if post.author_id != user_id {
        warn!(post_id = id, user_id, author_id = post.author_id, "non-author tried to modify post");
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

pub async fn update(db: &SqlitePool, post: &PostRow, form: &PostForm) -> Result<(), SubmitError> {
    validate(form).into_result()?;
    repo::update(db, post.id, &form.title, &form.content).await?;
    info!(post_id = post.id, "post updated");
    Ok(())
}

pub async fn delete(db: &SqlitePool, post: &PostRow) -> AppResult<()> {
    repo::delete(db, post.id).await?;
    info!(post_id = post.id, "post deleted");
    Ok(())
}

pub async fn latest(db: &SqlitePool, page: i64) -> AppResult<Paginated<PostRow>> {
    let total = repo::count(db).await?;
    let offset = page_offset(page, total)?;
    let items = repo::list_page(db, POSTS_PER_PAGE, offset).await?;
    Ok(Paginated::new(items, page, POSTS_PER_PAGE, total))
}

pub async fn by_author(
    db: &SqlitePool,
    username: &str,
    page: i64,
) -> AppResult<(User, Paginated<PostRow>)> {
    let user = users::find_by_username(db, username)
        .await?
        .ok_or(AppError::NotFound)?;
    let total = repo::count_by_author(db, user.id).await?;
    let offset = page_offset(page, total)?;
    let items = repo::list_page_by_author(db, user.id, POSTS_PER_PAGE, offset).await?;
    Ok((user, Paginated::new(items, page, POSTS_PER_PAGE, total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn post(title: &str, content: &str) -> PostForm {
        PostForm {
            title: title.into(),
            content: content.into(),
        }
    }

    #[test]
    fn validation_requires_title_and_content() {
        assert!(validate(&post("T", "C")).is_empty());
        let errors = validate(&post(" ", ""));
        assert!(errors.has("title") && errors.has("content"));
        assert!(validate(&post(&"x".repeat(101), "C")).has("title"));
    }

    #[test]
    fn page_offsets() {
        assert_eq!(page_offset(1, 0).unwrap(), 0);
        assert_eq!(page_offset(2, 6).unwrap(), 5);
        assert!(matches!(page_offset(2, 5), Err(AppError::NotFound)));
        assert!(matches!(page_offset(0, 5), Err(AppError::NotFound)));
        assert!(matches!(page_offset(i64::MAX, 5), Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn only_the_author_owns_a_post() {
        let db = db::connect_in_memory().await.unwrap();
        db::migrate(&db).await.unwrap();
        let alice = users::create(&db, "alice", "a@x.com", "h").await.unwrap();
        let bob = users::create(&db, "bob", "b@x.com", "h").await.unwrap();

        let id = create(&db, alice.id, &post("T", "C")).await.unwrap();
        assert!(owned(&db, id, alice.id).await.is_ok());
        assert!(matches!(owned(&db, id, bob.id).await, Err(AppError::Forbidden)));
        assert!(matches!(owned(&db, id + 1, alice.id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn deleted_posts_leave_both_listings() {
        let db = db::connect_in_memory().await.unwrap();
        db::migrate(&db).await.unwrap();
        let alice = users::create(&db, "alice", "a@x.com", "h").await.unwrap();
        let keep = create(&db, alice.id, &post("keep", "C")).await.unwrap();
        let gone = create(&db, alice.id, &post("gone", "C")).await.unwrap();

        let row = owned(&db, gone, alice.id).await.unwrap();
        delete(&db, &row).await.unwrap();

        let home = latest(&db, 1).await.unwrap();
        assert_eq!(home.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![keep]);
        let (_, mine) = by_author(&db, "alice", 1).await.unwrap();
        assert_eq!(mine.total, 1);
        assert!(matches!(by_author(&db, "nobody", 1).await, Err(AppError::NotFound)));
    }
}
