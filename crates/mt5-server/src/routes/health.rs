//! Health and metrics endpoints (public).

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::error_response;

/// Liveness probe.
pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// Prometheus text exposition.
pub async fn metrics() -> Response {
    match mt5_telemetry::metrics::gather() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
