use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};

use storefront_cart::{CartItem, CartRecord, LineItem};
use storefront_core::{CartId, CoreError, CoreResult, ProductId};

use crate::classify::{ClassifyExt, ErrorClassifier, StoreOperation};
use crate::store::{Store, StoreTransaction};

/// Transactional batch writes to a cart's line items.
///
/// Every batch runs in one store transaction: either all of its items are
/// applied or none are. Repeated adds of the same product increment the
/// existing count instead of overwriting it.
pub struct CartAggregateStore<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> CartAggregateStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a cart and merge `items` into it, in one transaction.
    #[instrument(skip(self, items), fields(item_count = items.len()), err)]
    pub async fn create(&self, items: &[CartItem]) -> CoreResult<CartId> {
        let op = StoreOperation::CreateCart;
        let cart = CartRecord::new(CartId::new(), Utc::now());

        let mut tx = self.begin(op).await?;
        let outcome = match tx.insert_cart(&cart).await.classify(op) {
            Ok(()) => merge_items(tx.as_mut(), cart.id, items, op).await,
            Err(err) => Err(err),
        };
        finish(tx, outcome, op).await?;
        Ok(cart.id)
    }

    /// Merge `items` into an existing cart: unseen products get a new line
    /// item, known ones have their count increased.
    #[instrument(skip(self, items), fields(cart_id = %cart_id, item_count = items.len()), err)]
    pub async fn add_items(&self, cart_id: CartId, items: &[CartItem]) -> CoreResult<()> {
        let op = StoreOperation::AddItems;
        let mut tx = self.begin(op).await?;
        let outcome = match merge_items(tx.as_mut(), cart_id, items, op).await {
            Ok(()) => touch_cart(tx.as_mut(), cart_id, op).await,
            Err(err) => Err(err),
        };
        finish(tx, outcome, op).await
    }

    /// Remove the line items of `product_ids` from the cart. Products without a
    /// line item are skipped.
    #[instrument(skip(self, product_ids), fields(cart_id = %cart_id, product_count = product_ids.len()), err)]
    pub async fn delete_products(&self, cart_id: CartId, product_ids: &[ProductId]) -> CoreResult<()> {
        let op = StoreOperation::RemoveItems;
        let mut tx = self.begin(op).await?;
        let outcome = match delete_line_items(tx.as_mut(), cart_id, product_ids, op).await {
            Ok(()) => touch_cart(tx.as_mut(), cart_id, op).await,
            Err(err) => Err(err),
        };
        finish(tx, outcome, op).await
    }

    async fn begin(&self, op: StoreOperation) -> CoreResult<Box<dyn StoreTransaction>> {
        self.store
            .begin()
            .await
            .map_err(|e| CoreError::internal(op.internal_message(), e))
    }
}

async fn merge_items(
    tx: &mut dyn StoreTransaction,
    cart_id: CartId,
    items: &[CartItem],
    op: StoreOperation,
) -> CoreResult<()> {
    for item in items {
        match tx.line_item(cart_id, item.product_id).await {
            Ok(existing) => {
                let merged = existing
                    .merged(item.count)
                    .map_err(|e| CoreError::validation("the item count is too large", e))?;
                tx.update_line_item(&merged).await.classify(op)?;
            }
            Err(err) if err.is_not_found() => {
                tx.insert_line_item(&LineItem::new(cart_id, *item))
                    .await
                    .classify(op)?;
            }
            Err(err) => return Err(ErrorClassifier::classify(op, err)),
        }
    }
    Ok(())
}

async fn delete_line_items(
    tx: &mut dyn StoreTransaction,
    cart_id: CartId,
    product_ids: &[ProductId],
    op: StoreOperation,
) -> CoreResult<()> {
    for product_id in product_ids {
        tx.delete_line_item(cart_id, *product_id).await.classify(op)?;
    }
    Ok(())
}

/// Bump the cart's `updated_at`. An absent cart touches nothing.
async fn touch_cart(tx: &mut dyn StoreTransaction, cart_id: CartId, op: StoreOperation) -> CoreResult<()> {
    tx.touch_cart(cart_id, Utc::now()).await.classify(op)?;
    Ok(())
}

/// Commit on success; roll back and return the original error otherwise.
async fn finish(
    tx: Box<dyn StoreTransaction>,
    outcome: CoreResult<()>,
    op: StoreOperation,
) -> CoreResult<()> {
    match outcome {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| CoreError::internal(op.internal_message(), e)),
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation = %op, error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
