use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Lifetime of a browser-session login.
    pub ttl_minutes: i64,
    /// Lifetime of a "remember me" login.
    pub remember_ttl_days: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://site.db".into());
        let session = SessionConfig {
            secret: std::env::var("SECRET_KEY").context("SECRET_KEY must be set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "inkpost".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "inkpost-web".into()),
            ttl_minutes: env_parse("SESSION_TTL_MINUTES").unwrap_or(60 * 24),
            remember_ttl_days: env_parse("REMEMBER_TTL_DAYS").unwrap_or(365),
            cookie_secure: env_parse("COOKIE_SECURE").unwrap_or(false),
        };
        let media = MediaConfig {
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
        };
        Ok(Self {
            database_url,
            session,
            media,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
