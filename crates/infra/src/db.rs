//! Store selection and Postgres connection bootstrap.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::DbConfig;
use crate::store::{InMemoryStore, PostgresStore, Store, StoreError, StoreResult};

/// Connect to Postgres, retrying `db_retries` times with a fixed pause.
pub async fn connect_with_retries(url: &str, config: &DbConfig) -> StoreResult<PgPool> {
    let attempts = config.db_retries.max(1);
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(url)
            .await
        {
            Ok(pool) => {
                info!(attempt, "connected to postgres");
                return Ok(pool);
            }
            Err(err) if attempt < attempts => {
                warn!(
                    attempt,
                    remaining = attempts - attempt,
                    error = %err,
                    "postgres connection failed, retrying"
                );
                tokio::time::sleep(config.retry_delay()).await;
                attempt += 1;
            }
            Err(err) => return Err(StoreError::backend("connect", err)),
        }
    }
}

/// Postgres store (migrated) when a database URL is configured, in-memory otherwise.
pub async fn open_store(config: &DbConfig) -> StoreResult<Arc<dyn Store>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = connect_with_retries(url, config).await?;
            let store = PostgresStore::new(pool);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            info!("no DATABASE_URL configured, using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
