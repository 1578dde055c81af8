use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, ProductId};

use crate::edits::ProductEdits;

/// Catalog entry.
///
/// Plain data record: persistence lives behind the store boundary, and the only
/// mutation path after creation is [`Product::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    /// Non-negative by convention; not enforced.
    pub price: f64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub image_url: String,
}

impl NewProduct {
    /// Trim `code` and `image_url`; trim and upper-case `name`.
    pub fn normalized(self) -> Self {
        Self {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_uppercase(),
            price: self.price,
            image_url: self.image_url.trim().to_string(),
        }
    }
}

impl Product {
    /// Build a new catalog entry from creation input (normalized here).
    pub fn create(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> Self {
        let new = new.normalized();
        Self {
            id,
            code: new.code,
            name: new.name,
            price: new.price,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply already-validated edits. Values are stored as given.
    pub fn apply(&mut self, edits: ProductEdits, now: DateTime<Utc>) {
        let ProductEdits {
            code,
            name,
            price,
            image_url,
        } = edits;

        if let Some(code) = code {
            self.code = code;
        }
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(image_url) = image_url {
            self.image_url = image_url;
        }
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}
