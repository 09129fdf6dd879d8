use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ImageDetails {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Name lookup row; shares its id with the matching `ImageDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct IndexEntry {
    pub id: i64,
    pub name: String,
}
