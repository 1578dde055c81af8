use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::{CartId, Entity, ProductId};
use storefront_products::Product;

/// Stored cart row (identity + metadata; line items live in their own rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    pub id: CartId,
    pub created_at: DateTime<Utc>,
    /// Advances whenever a batch changes the cart's line items.
    pub updated_at: DateTime<Utc>,
}

impl CartRecord {
    pub fn new(id: CartId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for CartRecord {
    type Id = CartId;

    fn id(&self) -> CartId {
        self.id
    }
}

/// Request to merge `count` units of a product into a cart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub count: u32,
}

impl CartItem {
    pub fn new(product_id: ProductId, count: u32) -> Self {
        Self { product_id, count }
    }
}

/// Uniqueness key of a line item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineItemKey {
    pub cart_id: CartId,
    pub product_id: ProductId,
}

/// Stored line item row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("count for product {product_id} would overflow ({current} + {added})")]
    CountOverflow {
        product_id: ProductId,
        current: u32,
        added: u32,
    },
}

impl LineItem {
    /// First line item for a product in a cart.
    pub fn new(cart_id: CartId, item: CartItem) -> Self {
        Self {
            cart_id,
            product_id: item.product_id,
            count: item.count,
        }
    }

    pub fn key(&self) -> LineItemKey {
        LineItemKey {
            cart_id: self.cart_id,
            product_id: self.product_id,
        }
    }

    /// The same line item with `added` more units (increment, never overwrite).
    pub fn merged(&self, added: u32) -> Result<Self, CartError> {
        let count = self
            .count
            .checked_add(added)
            .ok_or(CartError::CountOverflow {
                product_id: self.product_id,
                current: self.count,
                added,
            })?;
        Ok(Self { count, ..*self })
    }
}

impl Entity for LineItem {
    type Id = LineItemKey;

    fn id(&self) -> LineItemKey {
        self.key()
    }
}

/// Line item resolved with the catalog entry it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub count: u32,
}

impl CartLine {
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }
}

/// Cart aggregate as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|l| l.product_id() == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * count` over every line.
    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|l| l.product.price * f64::from(l.count))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use storefront_products::NewProduct;

    fn product(price: f64) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                code: "A1".to_string(),
                name: "widget".to_string(),
                price,
                image_url: "u".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn merge_increments_instead_of_overwriting() {
        let item = LineItem::new(CartId::new(), CartItem::new(ProductId::new(), 2));
        let merged = item.merged(3).unwrap();
        assert_eq!(merged.count, 5);
        assert_eq!(merged.key(), item.key());
    }

    #[test]
    fn merge_rejects_overflow() {
        let item = LineItem::new(CartId::new(), CartItem::new(ProductId::new(), u32::MAX));
        let err = item.merged(1).unwrap_err();
        assert!(matches!(err, CartError::CountOverflow { current: u32::MAX, added: 1, .. }));
    }

    #[test]
    fn line_item_identity_is_the_pair() {
        let cart_id = CartId::new();
        let product_id = ProductId::new();
        let a = LineItem::new(cart_id, CartItem::new(product_id, 1));
        let b = LineItem::new(cart_id, CartItem::new(product_id, 7));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn subtotal_sums_price_times_count() {
        let cart = Cart {
            id: CartId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![
                CartLine {
                    product: product(2.5),
                    count: 2,
                },
                CartLine {
                    product: product(1.0),
                    count: 3,
                },
            ],
        };
        assert_eq!(cart.subtotal(), 8.0);
        let first = cart.items[0].product_id();
        assert_eq!(cart.line(first).map(|l| l.count), Some(2));
    }

    proptest! {
        /// Property: successive merges accumulate to the sum of their counts.
        #[test]
        fn merges_accumulate(counts in proptest::collection::vec(0u32..10_000, 1..20)) {
            let mut item = LineItem::new(CartId::new(), CartItem::new(ProductId::new(), counts[0]));
            for count in &counts[1..] {
                item = item.merged(*count).unwrap();
            }
            prop_assert_eq!(u64::from(item.count), counts.iter().map(|c| u64::from(*c)).sum::<u64>());
        }
    }
}
