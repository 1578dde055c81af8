use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::instrument;

use storefront_core::{CoreError, CoreResult, ProductId};
use storefront_products::{Product, ProductEdits};

use crate::classify::{ClassifyExt, StoreOperation};
use crate::store::Store;

/// All-or-nothing application of loosely-typed field edits to a product.
pub struct ProductFieldUpdater<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> ProductFieldUpdater<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate every entry of `fields`, then save the edited product.
    ///
    /// `product` only changes once the save succeeded; on any error it is left
    /// exactly as passed in.
    #[instrument(skip(self, product, fields), fields(product_id = %product.id), err)]
    pub async fn apply(&self, product: &mut Product, fields: &Map<String, Value>) -> CoreResult<()> {
        let edits = ProductEdits::from_fields(fields)
            .map_err(|e| CoreError::validation(e.user_message(), e))?;

        let mut updated = product.clone();
        updated.apply(edits, Utc::now());
        self.store
            .update_product(&updated)
            .await
            .classify(StoreOperation::UpdateProduct)?;

        *product = updated;
        Ok(())
    }

    /// Load the product, then [`apply`](Self::apply) the edits.
    ///
    /// An absent product reports `NotFound` before the edits are looked at.
    pub async fn update(&self, id: ProductId, fields: &Map<String, Value>) -> CoreResult<Product> {
        let mut product = self
            .store
            .product_by_id(id)
            .await
            .classify(StoreOperation::UpdateProduct)?;
        self.apply(&mut product, fields).await?;
        Ok(product)
    }
}
