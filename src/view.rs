//! View models and the single rendering function every page goes through.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::{
    auth::{dto::PublicUser, extractors::MaybeUser},
    cookies,
    error::AppError,
    flash::{self, Flash},
    state::AppState,
};

/// Page body for templates that need nothing beyond the layout.
#[derive(Debug, Default, Serialize)]
pub struct NoContext {}

#[derive(Serialize)]
struct Page<'a, T: Serialize> {
    template: &'a str,
    title: Option<&'a str>,
    current_user: Option<&'a PublicUser>,
    flashes: &'a [Flash],
    #[serde(flatten)]
    body: T,
}

/// Layout context for a request: who is logged in and which flashes are pending.
pub struct View {
    user: Option<PublicUser>,
    flashes: Vec<Flash>,
    consumed_cookie: bool,
}

impl View {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            flashes: Vec::new(),
            consumed_cookie: false,
        }
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    pub fn render<T: Serialize>(self, template: &str, title: Option<&str>, body: T) -> Response {
        self.render_status(StatusCode::OK, template, title, body)
    }

    pub fn render_status<T: Serialize>(
        self,
        status: StatusCode,
        template: &str,
        title: Option<&str>,
        body: T,
    ) -> Response {
        let page = Page {
            template,
            title,
            current_user: self.user.as_ref(),
            flashes: &self.flashes,
            body,
        };
        let mut res = (status, Json(page)).into_response();
        if self.consumed_cookie {
            if let Err(e) = cookies::append(&mut res, &cookies::expire(flash::COOKIE)) {
                warn!(error = %e, "flash cookie not cleared");
            }
        }
        res
    }
}

#[async_trait]
impl FromRequestParts<AppState> for View {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        let flashes = flash::take(&parts.headers);
        Ok(Self {
            user: user.map(|u| PublicUser::new(&u.user, state.storage.as_ref())),
            consumed_cookie: !flashes.is_empty(),
            flashes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use serde_json::Value;

    async fn body_json(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[derive(Serialize)]
    struct Greeting {
        greeting: &'static str,
    }

    #[tokio::test]
    async fn render_flattens_body_into_layout() {
        let mut view = View::anonymous();
        view.flash(Flash::info("hi"));
        let res = view.render("about.html", Some("About"), Greeting { greeting: "hello" });
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(header::SET_COOKIE).is_none());

        let json = body_json(res).await;
        assert_eq!(json["template"], "about.html");
        assert_eq!(json["title"], "About");
        assert_eq!(json["greeting"], "hello");
        assert!(json["current_user"].is_null());
        assert_eq!(json["flashes"][0]["category"], "info");
    }

    #[tokio::test]
    async fn consumed_flash_cookie_is_expired() {
        let view = View {
            user: None,
            flashes: vec![Flash::success("done")],
            consumed_cookie: true,
        };
        let res = view.render("home.html", None, NoContext::default());
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
