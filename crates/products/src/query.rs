//! Catalog listing query model.
//!
//! [`ListProducts`] is the raw request (1-based page, page size, search term,
//! order column name). [`ListProducts::into_query`] validates it into a
//! [`ProductQuery`] that storage backends execute as filter + order + offset/limit.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::product::Product;

/// Raw listing request, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProducts {
    pub page: i64,
    pub page_size: i64,
    pub search_term: String,
    pub order_by: String,
    pub ascending: bool,
}

/// Listing request rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("page must be >= 1, got {0}")]
    InvalidPage(i64),

    #[error("page size must be >= 0, got {0}")]
    InvalidPageSize(i64),

    #[error("page {page} with page size {page_size} is out of range")]
    OutOfRange { page: i64, page_size: i64 },

    #[error("cannot order by unknown column '{0}'")]
    UnknownColumn(String),
}

impl QueryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            QueryError::InvalidPage(_) => "the page number must be 1 or greater",
            QueryError::InvalidPageSize(_) => "the page size cannot be negative",
            QueryError::OutOfRange { .. } => "the requested page is out of range",
            QueryError::UnknownColumn(_) => {
                "products can only be ordered by id, code, name, price or imageURL"
            }
        }
    }
}

/// Columns a listing can be ordered by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductColumn {
    Id,
    Code,
    Name,
    Price,
    ImageUrl,
}

impl ProductColumn {
    /// Column name in the relational schema.
    pub fn column_name(self) -> &'static str {
        match self {
            ProductColumn::Id => "id",
            ProductColumn::Code => "code",
            ProductColumn::Name => "name",
            ProductColumn::Price => "price",
            ProductColumn::ImageUrl => "image_url",
        }
    }
}

impl FromStr for ProductColumn {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(ProductColumn::Id),
            "code" => Ok(ProductColumn::Code),
            "name" => Ok(ProductColumn::Name),
            "price" => Ok(ProductColumn::Price),
            "imageurl" | "image_url" => Ok(ProductColumn::ImageUrl),
            _ => Err(QueryError::UnknownColumn(s.to_string())),
        }
    }
}

/// Ordering applied to a listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOrder {
    pub column: ProductColumn,
    pub ascending: bool,
}

impl ProductOrder {
    /// Compare two products under this ordering.
    pub fn compare(&self, a: &Product, b: &Product) -> core::cmp::Ordering {
        let ord = match self.column {
            ProductColumn::Id => a.id.cmp(&b.id),
            ProductColumn::Code => a.code.cmp(&b.code),
            ProductColumn::Name => a.name.cmp(&b.name),
            ProductColumn::Price => a.price.total_cmp(&b.price),
            ProductColumn::ImageUrl => a.image_url.cmp(&b.image_url),
        };
        if self.ascending { ord } else { ord.reverse() }
    }
}

/// Row predicate of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring the product name must contain.
    pub name_contains: Option<String>,
}

impl ProductFilter {
    /// Filter for a search term; an empty term matches every product.
    pub fn search(term: &str) -> Self {
        Self {
            name_contains: (!term.is_empty()).then(|| term.to_string()),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        match &self.name_contains {
            Some(needle) => product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Validated listing query: filter, optional order, offset/limit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    /// `None` leaves the result order unspecified.
    pub order: Option<ProductOrder>,
    pub offset: u64,
    pub limit: u64,
}

impl ListProducts {
    pub fn into_query(self) -> Result<ProductQuery, QueryError> {
        if self.page < 1 {
            return Err(QueryError::InvalidPage(self.page));
        }
        if self.page_size < 0 {
            return Err(QueryError::InvalidPageSize(self.page_size));
        }

        let offset = (self.page - 1)
            .checked_mul(self.page_size)
            .ok_or(QueryError::OutOfRange {
                page: self.page,
                page_size: self.page_size,
            })?;

        let order = if self.order_by.is_empty() {
            None
        } else {
            Some(ProductOrder {
                column: self.order_by.parse()?,
                ascending: self.ascending,
            })
        };

        Ok(ProductQuery {
            filter: ProductFilter::search(&self.search_term),
            order,
            offset: offset as u64,
            limit: self.page_size as u64,
        })
    }
}
