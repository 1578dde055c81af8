//! Catalog domain module.
//!
//! This crate contains the rules for catalog entries, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): creation-time
//! normalization, validated sparse edits and the listing query model.

pub mod edits;
pub mod product;
pub mod query;

pub use edits::{FieldEditError, ProductEdits, ProductField};
pub use product::{NewProduct, Product};
pub use query::{
    ListProducts, ProductColumn, ProductFilter, ProductOrder, ProductQuery, QueryError,
};
