//! Infrastructure layer: storage backends, the catalog/cart engines built on
//! them, configuration and database bootstrap.

pub mod cart_store;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod db;
pub mod services;
pub mod store;
pub mod updater;

pub use cart_store::CartAggregateStore;
pub use catalog::{CatalogQueryEngine, ProductPage};
pub use classify::{ClassifyExt, ErrorClassifier, StoreOperation};
pub use config::DbConfig;
pub use services::Storefront;
pub use store::{InMemoryStore, PostgresStore, Store, StoreError, StoreResult, StoreTransaction};
pub use updater::ProductFieldUpdater;

#[cfg(test)]
mod integration_tests;
