use crate::config::{AppConfig, MediaConfig, SessionConfig};
use crate::db;
use crate::storage::{LocalStorage, StorageClient};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;

        let storage =
            Arc::new(LocalStorage::new(&config.media.static_dir)) as Arc<dyn StorageClient>;

        Ok(Self {
            db,
            config,
            storage,
        })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
        }
    }

    /// Migrated in-memory database and local storage rooted at `static_dir`.
    pub async fn ephemeral(static_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let static_dir = static_dir.into();
        let db = db::connect_in_memory().await?;
        db::migrate(&db).await?;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            session: SessionConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                remember_ttl_days: 30,
                cookie_secure: false,
            },
            media: MediaConfig {
                static_dir: static_dir.clone(),
            },
        });

        let storage = Arc::new(LocalStorage::new(static_dir)) as Arc<dyn StorageClient>;
        Ok(Self::from_parts(db, config, storage))
    }
}
