use serde::{Deserialize, Serialize};

use crate::{auth::dto::PublicUser, forms::FormErrors, posts::repo_types::PostRow};

pub const POSTS_PER_PAGE: i64 = 5;

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// `?page=`; anything that is not an integer means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// One page of results plus the numbers needed to link neighbours.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<i64>,
    pub next_num: Option<i64>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let pages = (total + per_page - 1) / per_page;
        let has_prev = page > 1;
        let has_next = page < pages;
        Self {
            items,
            page,
            per_page,
            total,
            pages,
            has_prev,
            has_next,
            prev_num: has_prev.then(|| page - 1),
            next_num: has_next.then(|| page + 1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListPage {
    pub posts: Paginated<PostRow>,
}

#[derive(Debug, Serialize)]
pub struct UserPostsPage {
    pub user: PublicUser,
    pub posts: Paginated<PostRow>,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub post: PostRow,
}

#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub legend: &'static str,
    pub form: PostForm,
    pub errors: FormErrors,
}
