//! `storefront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the entity trait and the classified error taxonomy every
//! storefront operation reports through.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{BoxError, CoreError, CoreResult, ErrorKind};
pub use id::{CartId, InvalidId, ProductId};
