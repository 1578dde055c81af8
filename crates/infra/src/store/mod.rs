//! Storage contract for catalog entries, carts and line items.
//!
//! Two backends implement it:
//! - [`InMemoryStore`] for tests and local development
//! - [`PostgresStore`] for durable storage
//!
//! Product operations run outside any explicit transaction. Cart writes go
//! through a [`StoreTransaction`] obtained from [`Store::begin`] so a whole batch
//! of line item changes becomes visible at once, or not at all.
//!
//! Reads inside a transaction are plain reads: no row is locked. Two concurrent
//! batches touching the same line item can therefore lose one of the
//! increments (both read the same count, last write wins).

mod error;
mod in_memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_cart::{Cart, CartRecord, LineItem};
use storefront_core::{CartId, ProductId};
use storefront_products::{Product, ProductFilter, ProductQuery};

pub use error::{StoreError, StoreResult};
pub use in_memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};

/// Persistent storage of the catalog and the carts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction for cart writes.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    async fn insert_product(&self, product: &Product) -> StoreResult<()>;

    /// Fails with [`StoreError::NotFound`] when no product has this id.
    async fn product_by_id(&self, id: ProductId) -> StoreResult<Product>;

    /// Full-row replace. Fails with [`StoreError::NotFound`] when the row is gone.
    async fn update_product(&self, product: &Product) -> StoreResult<()>;

    /// Removes the product and every line item referencing it.
    /// Deleting an absent product is not an error.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    /// Products matching the filter, ordered, then windowed by offset/limit.
    async fn query_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>>;

    /// Number of products matching the filter, ignoring any window.
    async fn count_products(&self, filter: &ProductFilter) -> StoreResult<u64>;

    /// Cart with its line items resolved to products, in insertion order.
    async fn cart_by_id(&self, id: CartId) -> StoreResult<Cart>;
}

/// Unit of work over carts and line items.
///
/// Writes stay invisible to other readers until [`StoreTransaction::commit`].
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_cart(&mut self, cart: &CartRecord) -> StoreResult<()>;

    /// Line item for `(cart_id, product_id)`, including this transaction's own
    /// writes. Fails with [`StoreError::NotFound`] when there is none.
    async fn line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<LineItem>;

    /// Fails with [`StoreError::UniqueViolation`] if the pair already exists and
    /// with [`StoreError::ForeignKeyViolation`] if the cart or product does not.
    async fn insert_line_item(&mut self, item: &LineItem) -> StoreResult<()>;

    /// Full-row replace of an existing line item.
    async fn update_line_item(&mut self, item: &LineItem) -> StoreResult<()>;

    /// Returns the number of removed rows (0 or 1).
    async fn delete_line_item(&mut self, cart_id: CartId, product_id: ProductId) -> StoreResult<u64>;

    /// Set the cart's `updated_at`. Returns the number of touched rows, so an
    /// absent cart yields 0 rather than an error.
    async fn touch_cart(&mut self, cart_id: CartId, at: DateTime<Utc>) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
