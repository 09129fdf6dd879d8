use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Post joined with the author's public fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_posted: OffsetDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_image_file: String,
}
