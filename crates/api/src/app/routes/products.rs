use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::{Map, Value};

use storefront_core::ProductId;

use crate::app::dto::{self, MessageResp, ProductDto, ProductsListResp};
use crate::app::errors::{self, ErrorBody};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/product/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

fn parse_product_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse()
        .map_err(|e| errors::bad_request("invalid product id", e))
}

/// Filter, order and paginate the catalog.
#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "products",
    params(
        ("page" = i64, Query, description = "1-based page number"),
        ("pageSize" = i64, Query, description = "Items per page; 0 returns only the total"),
        ("searchTerm" = Option<String>, Query, description = "Case-insensitive name substring"),
        ("orderBy" = Option<String>, Query, description = "id, code, name, price or imageURL (default price)"),
        ("ascending" = Option<bool>, Query, description = "Sort direction (default true)"),
    ),
    responses(
        (status = 200, description = "One page of products and the total match count", body = ProductsListResp),
        (status = 400, description = "Invalid listing parameters", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ListProductsParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return errors::bad_request("invalid listing parameters", e),
    };

    match services.list_products(params.into()).await {
        Ok(page) => Json(ProductsListResp::from(page)).into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/v1/products",
    tag = "products",
    request_body = dto::ProductData,
    responses(
        (status = 201, description = "Product created", body = ProductDto),
        (status = 400, description = "Invalid product data", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ProductData>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request("invalid product data", e),
    };

    match services.create_product(body.into()).await {
        Ok(product) => (StatusCode::CREATED, Json(ProductDto::from(product))).into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/v1/product/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductDto),
        (status = 400, description = "Invalid product id", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.get_product(id).await {
        Ok(product) => Json(ProductDto::from(product)).into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

/// Apply a set of field edits; nothing is saved unless every edit is valid.
#[utoipa::path(
    patch,
    path = "/v1/product/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    request_body = dto::ProductPatch,
    responses(
        (status = 200, description = "Product updated", body = MessageResp),
        (status = 400, description = "Invalid id or edits", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(fields) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request("invalid product update data", e),
    };

    match services.update_product(id, &fields).await {
        Ok(_) => Json(MessageResp {
            message: "product updated successfully",
        })
        .into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/product/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product deleted (or already absent)", body = MessageResp),
        (status = 400, description = "Invalid product id", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.delete_product(id).await {
        Ok(()) => Json(MessageResp {
            message: "product deleted successfully",
        })
        .into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}
