//! Storefront operations, composed from the store and the three engines.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use storefront_cart::{Cart, CartItem};
use storefront_core::{CartId, CoreResult, ProductId};
use storefront_products::{ListProducts, NewProduct, Product};

use crate::cart_store::CartAggregateStore;
use crate::catalog::{CatalogQueryEngine, ProductPage};
use crate::classify::{ClassifyExt, StoreOperation};
use crate::store::{InMemoryStore, Store};
use crate::updater::ProductFieldUpdater;

/// Every catalog and cart operation the service exposes.
///
/// All failures come back as [`storefront_core::CoreError`].
pub struct Storefront<S: ?Sized> {
    store: Arc<S>,
    catalog: CatalogQueryEngine<S>,
    updater: ProductFieldUpdater<S>,
    carts: CartAggregateStore<S>,
}

impl Storefront<InMemoryStore> {
    /// Storefront over a fresh [`InMemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

impl<S: Store + ?Sized> Storefront<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            catalog: CatalogQueryEngine::new(Arc::clone(&store)),
            updater: ProductFieldUpdater::new(Arc::clone(&store)),
            carts: CartAggregateStore::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn list_products(&self, request: ListProducts) -> CoreResult<ProductPage> {
        self.catalog.list(request).await
    }

    pub async fn get_product(&self, id: ProductId) -> CoreResult<Product> {
        self.store
            .product_by_id(id)
            .await
            .classify(StoreOperation::GetProduct)
    }

    /// Assigns a fresh id; code, name and image URL are normalized.
    #[instrument(skip(self, new), err)]
    pub async fn create_product(&self, new: NewProduct) -> CoreResult<Product> {
        let product = Product::create(ProductId::new(), new, Utc::now());
        self.store
            .insert_product(&product)
            .await
            .classify(StoreOperation::CreateProduct)?;
        info!(product_id = %product.id, code = %product.code, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, fields: &Map<String, Value>) -> CoreResult<Product> {
        self.updater.update(id, fields).await
    }

    /// Also drops the product from every cart. Absent products are not an error.
    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId) -> CoreResult<()> {
        self.store
            .delete_product(id)
            .await
            .classify(StoreOperation::DeleteProduct)
    }

    /// Create a cart holding `items` (possibly none) and read it back.
    pub async fn create_cart(&self, items: &[CartItem]) -> CoreResult<Cart> {
        let id = self.carts.create(items).await?;
        info!(cart_id = %id, "cart created");
        self.get_cart(id).await
    }

    pub async fn get_cart(&self, id: CartId) -> CoreResult<Cart> {
        self.store
            .cart_by_id(id)
            .await
            .classify(StoreOperation::GetCart)
    }

    pub async fn add_items_to_cart(&self, cart_id: CartId, items: &[CartItem]) -> CoreResult<()> {
        self.carts.add_items(cart_id, items).await
    }

    pub async fn remove_items_from_cart(&self, cart_id: CartId, product_ids: &[ProductId]) -> CoreResult<()> {
        self.carts.delete_products(cart_id, product_ids).await
    }
}
