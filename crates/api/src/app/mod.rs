//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the [`services::AppServices`] handle
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses
//! - `openapi.rs`: generated API document (JSON + Swagger UI)

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod openapi;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/ping", get(routes::system::ping))
        .route("/health", get(routes::system::health))
        .nest("/v1", routes::router())
        .merge(SwaggerUi::new(openapi::SWAGGER_UI_PATH).url(openapi::OPENAPI_JSON_PATH, openapi::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(axum::middleware::from_fn(middleware::cors))
                .layer(Extension(services)),
        )
}
