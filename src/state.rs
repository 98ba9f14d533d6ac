use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db;
use crate::feeds::{cache::ResponseCache, Feeds};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub cache: ResponseCache,
    pub feeds: Arc<Feeds>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        Self::from_parts(db, config)
    }

    /// Assemble state from an already connected pool; used by tests to
    /// inject an in-memory database and mock upstream URLs.
    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let feeds = Arc::new(Feeds::from_config(&config.feeds)?);
        Ok(Self {
            db,
            config,
            cache: ResponseCache::new(),
            feeds,
        })
    }
}
