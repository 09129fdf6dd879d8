use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{repo_types::User, session},
    cookies,
    error::AppError,
    flash::{self, Flash},
    state::AppState,
};

/// The logged-in user behind the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Optional identity; resolved once per request and cached in the extensions.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<MaybeUser>() {
            return Ok(cached.clone());
        }

        let current = match cookies::read(&parts.headers, session::COOKIE) {
            Some(token) => session::resolve(state, token).await?.map(|(s, user)| CurrentUser {
                user,
                session_id: s.id,
                token: token.to_string(),
            }),
            None => None,
        };

        let resolved = MaybeUser(current);
        parts.extensions.insert(resolved.clone());
        Ok(resolved)
    }
}

/// Required identity. Anonymous callers are sent to the login page with the
/// requested path in `next`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(current) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match current {
            Some(user) => Ok(AuthUser(user)),
            None => {
                let requested = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!(requested, "login required");
                Err(flash::redirect(
                    &login_url(requested),
                    Flash::info("Please log in to access this page."),
                ))
            }
        }
    }
}

pub fn login_url(next: &str) -> String {
    format!("/login?next={}", urlencoding::encode(next))
}

/// Only same-site absolute paths are honoured as post-login targets.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.starts_with("/\\"))
}
