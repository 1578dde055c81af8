use axum::{Json, http::StatusCode};

use crate::app::dto::MessageResp;

pub async fn root() -> Json<MessageResp> {
    Json(MessageResp {
        message: "service is online",
    })
}

pub async fn ping() -> Json<MessageResp> {
    Json(MessageResp { message: "pong" })
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
