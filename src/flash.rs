//! One-shot notices carried to the next rendered page in the `flash` cookie.

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cookies;

pub const COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Info,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: Category::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: Category::Info,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: Category::Danger,
            message: message.into(),
        }
    }
}

pub fn encode(flashes: &[Flash]) -> String {
    // Serializing a Vec of plain structs cannot fail.
    let json = serde_json::to_vec(flashes).unwrap_or_default();
    Base64UrlUnpadded::encode_string(&json)
}

/// Malformed cookies decode to no messages.
pub fn decode(raw: &str) -> Vec<Flash> {
    let Ok(bytes) = Base64UrlUnpadded::decode_vec(raw) else {
        return Vec::new();
    };
    serde_json::from_slice(&bytes).unwrap_or_default()
}

pub fn take(headers: &HeaderMap) -> Vec<Flash> {
    cookies::read(headers, COOKIE)
        .map(decode)
        .unwrap_or_default()
}

/// 303 redirect that leaves `flash` for the next page.
pub fn redirect(to: &str, flash: Flash) -> Response {
    let mut res = Redirect::to(to).into_response();
    let cookie = cookies::build(COOKIE, &encode(&[flash]), None, false);
    if let Err(e) = cookies::append(&mut res, &cookie) {
        warn!(error = %e, "flash cookie dropped");
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn encode_decode_keeps_order_and_category() {
        let flashes = vec![
            Flash::success("Your post has been created!"),
            Flash::danger("Login Unsuccessful. Please check email and password"),
        ];
        let raw = encode(&flashes);
        assert!(!raw.contains(';'));
        assert_eq!(decode(&raw), flashes);
    }

    #[test]
    fn garbage_cookie_yields_nothing() {
        assert!(decode("%%%").is_empty());
        assert!(decode(&Base64UrlUnpadded::encode_string(b"not json")).is_empty());
    }

    #[test]
    fn redirect_sets_location_and_cookie() {
        let res = redirect("/login", Flash::info("Please log in to access this page."));
        assert!(res.status().is_redirection());
        assert_eq!(res.headers()[header::LOCATION], "/login");
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash="));
    }
}
