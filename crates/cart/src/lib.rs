//! Cart domain module.
//!
//! A cart exclusively owns its line items; each line item references a catalog
//! entry without owning it. At most one line item exists per `(cart, product)`
//! pair, and merging a product that is already in the cart increments its count.

pub mod cart;

pub use cart::{Cart, CartError, CartItem, CartLine, CartRecord, LineItem, LineItemKey};
