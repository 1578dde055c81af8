use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use storefront_cart::CartItem;
use storefront_core::{CartId, ProductId};

use crate::app::dto::{self, ShoppingCartDto};
use crate::app::errors::{self, ErrorBody};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/carts", post(create_cart))
        .route("/cart/:id", get(get_cart))
        .route("/cart/:id/items", post(add_item).delete(remove_items))
}

fn parse_cart_id(id: &str) -> Result<CartId, axum::response::Response> {
    id.parse().map_err(|e| errors::bad_request("invalid cart id", e))
}

/// Read the cart back and render it with `status`.
async fn respond_with_cart(
    services: &AppServices,
    id: CartId,
    status: StatusCode,
) -> axum::response::Response {
    match services.get_cart(id).await {
        Ok(cart) => (status, Json(ShoppingCartDto::from(cart))).into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/v1/carts",
    tag = "carts",
    request_body = Vec<dto::ItemData>,
    responses(
        (status = 201, description = "Cart created", body = ShoppingCartDto),
        (status = 400, description = "Invalid cart data", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn create_cart(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Vec<dto::ItemData>>, JsonRejection>,
) -> axum::response::Response {
    let Json(items) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request("invalid cart data", e),
    };

    match services.create_cart(&dto::to_cart_items(items)).await {
        Ok(cart) => (StatusCode::CREATED, Json(ShoppingCartDto::from(cart))).into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/v1/cart/{id}",
    tag = "carts",
    params(
        ("id" = String, Path, description = "Cart id")
    ),
    responses(
        (status = 200, description = "Cart found", body = ShoppingCartDto),
        (status = 400, description = "Invalid cart id", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_cart_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond_with_cart(&services, id, StatusCode::OK).await
}

/// Merge one item into the cart; an existing line has its count increased.
#[utoipa::path(
    post,
    path = "/v1/cart/{id}/items",
    tag = "carts",
    params(
        ("id" = String, Path, description = "Cart id")
    ),
    request_body = dto::ItemData,
    responses(
        (status = 200, description = "Updated cart", body = ShoppingCartDto),
        (status = 400, description = "Invalid id or item", body = ErrorBody),
        (status = 500, description = "Unknown cart or product, or storage failure", body = ErrorBody),
    )
)]
pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ItemData>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_cart_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(item) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request("invalid item data", e),
    };

    if let Err(e) = services.add_items_to_cart(id, &[CartItem::from(item)]).await {
        return errors::core_error_to_response(e);
    }
    respond_with_cart(&services, id, StatusCode::OK).await
}

#[utoipa::path(
    delete,
    path = "/v1/cart/{id}/items",
    tag = "carts",
    params(
        ("id" = String, Path, description = "Cart id")
    ),
    request_body = Vec<String>,
    responses(
        (status = 200, description = "Updated cart", body = ShoppingCartDto),
        (status = 400, description = "Invalid id or product ids", body = ErrorBody),
        (status = 404, description = "Cart not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn remove_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Vec<ProductId>>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_cart_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(product_ids) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request("invalid product ids", e),
    };

    if let Err(e) = services.remove_items_from_cart(id, &product_ids).await {
        return errors::core_error_to_response(e);
    }
    respond_with_cart(&services, id, StatusCode::OK).await
}
