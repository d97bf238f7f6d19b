use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::records::{
    memory::InMemoryRecordStore,
    repo::{PgRecordStore, RecordStore},
    services::RecordsService,
};

#[derive(Clone)]
pub struct AppState {
    pub records: RecordsService,
}

impl AppState {
    /// Connects the configured store. Returns the pool too so the caller can
    /// run migrations against it.
    pub async fn init(config: &AppConfig) -> anyhow::Result<(Self, Option<PgPool>)> {
        let (store, pool) = match &config.database {
            Some(db_cfg) => {
                let pool = PgPoolOptions::new()
                    .max_connections(db_cfg.max_connections)
                    .connect(&db_cfg.url)
                    .await
                    .context("connect to database")?;
                info!(max_connections = db_cfg.max_connections, "using postgres record store");
                (
                    Arc::new(PgRecordStore::new(pool.clone())) as Arc<dyn RecordStore>,
                    Some(pool),
                )
            }
            None => {
                warn!("DATABASE_URL not set; records are kept in memory only");
                (
                    Arc::new(InMemoryRecordStore::new()) as Arc<dyn RecordStore>,
                    None,
                )
            }
        };

        Ok((Self::from_parts(store, config.page_size), pool))
    }

    pub fn from_parts(store: Arc<dyn RecordStore>, page_size: u32) -> Self {
        Self {
            records: RecordsService::new(store, page_size),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_store(InMemoryRecordStore::new())
    }

    /// In-memory state with a page size of 2.
    #[cfg(test)]
    pub fn fake_with_store(store: InMemoryRecordStore) -> Self {
        Self::from_parts(Arc::new(store) as Arc<dyn RecordStore>, 2)
    }
}
