//! HTTP handlers

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::dispatch;
use crate::server::ServerState;

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
}

/// Service status
pub async fn status_handler() -> impl IntoResponse {
    let response = StatusResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Dispatch endpoint. Takes the raw bytes so malformed JSON or non-UTF-8
/// input gets the dispatcher's own error payload instead of an extractor
/// rejection.
pub async fn mcp_handler(State(state): State<ServerState>, body: Bytes) -> impl IntoResponse {
    let response = dispatch::handle_request(&state.log, &body, &state.default_user).await;
    (response.status, Json(response.body)).into_response()
}
