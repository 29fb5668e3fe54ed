//! Account endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use mt5_gateway::GatewayError;

use super::error_response;
use crate::state::AppState;

/// `GET /account_info` — snapshot of the connected trading account.
pub async fn account_info(State(state): State<AppState>) -> Response {
    match state.gateway.fetch_account_info().await {
        Ok(account) => Json(account).into_response(),
        Err(GatewayError::Terminal { code, message }) => {
            warn!(code, message = %message, "Failed to get account info");
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Failed to get account info from the terminal.",
                    "terminal_error_code": code,
                    "terminal_error_message": message,
                })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Account info request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
