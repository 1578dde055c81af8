use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use storefront_core::{CoreError, CoreResult};
use storefront_products::{ListProducts, Product};

use crate::classify::{ClassifyExt, StoreOperation};
use crate::store::Store;

/// One page of a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    /// Matching products across all pages.
    pub total: u64,
}

/// Filtered, ordered, paginated catalog listing.
pub struct CatalogQueryEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> CatalogQueryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The total is computed over the filter alone, before the page window.
    #[instrument(
        skip(self, request),
        fields(page = request.page, page_size = request.page_size),
        err
    )]
    pub async fn list(&self, request: ListProducts) -> CoreResult<ProductPage> {
        let query = request
            .into_query()
            .map_err(|e| CoreError::validation(e.user_message(), e))?;

        let total = self
            .store
            .count_products(&query.filter)
            .await
            .classify(StoreOperation::CountProducts)?;

        let items = if query.limit == 0 {
            Vec::new()
        } else {
            self.store
                .query_products(&query)
                .await
                .classify(StoreOperation::ListProducts)?
        };

        Ok(ProductPage { items, total })
    }
}
