use std::sync::Arc;

use storefront_infra::{InMemoryStore, Storefront, Store, StoreResult, db};
use storefront_infra::DbConfig;

/// Shared handle every handler works through.
pub type AppServices = Storefront<dyn Store>;

/// Services over the configured store (Postgres when a database URL is set).
pub async fn build_services(config: &DbConfig) -> StoreResult<AppServices> {
    let store = db::open_store(config).await?;
    Ok(Storefront::new(store))
}

/// Services over a fresh in-memory store.
pub fn in_memory() -> AppServices {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    Storefront::new(store)
}
