use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use storefront_core::{CoreError, ErrorKind};

pub fn core_error_to_response(err: CoreError) -> axum::response::Response {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err.diagnostic(), "{}", err.message());
    }
    json_error(status, err.message(), err.diagnostic())
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Short user-facing message.
    pub message: String,
    /// Underlying cause chain.
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

/// `{"message": ..., "errorMessage": ...}` with the given status.
pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
    error_message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(ErrorBody {
            message: message.into(),
            error_message: error_message.into(),
        }),
    )
        .into_response()
}

pub fn bad_request(message: &str, err: impl std::fmt::Display) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, message, err.to_string())
}
