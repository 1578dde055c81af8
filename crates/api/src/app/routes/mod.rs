use axum::Router;

pub mod carts;
pub mod products;
pub mod system;

/// Router for the versioned (`/v1`) endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(products::router())
        .merge(carts::router())
}
