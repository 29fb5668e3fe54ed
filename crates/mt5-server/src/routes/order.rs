//! Order submission endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use mt5_core::{FillPolicy, OrderRequest, OrderType, Price, Volume};
use mt5_gateway::GatewayError;
use mt5_telemetry::Metrics;

use super::error_response;
use crate::state::AppState;

/// `POST /order` body. Market, pending, and stop-limit orders share one
/// shape; the pending-only fields are validated per order type.
#[derive(Debug, Deserialize)]
pub struct OrderBody {
    symbol: String,
    volume: Volume,
    #[serde(rename = "type")]
    order_type: OrderType,
    price: Option<Price>,
    stoplimit: Option<Price>,
    sl: Option<Price>,
    tp: Option<Price>,
    #[serde(default = "default_deviation")]
    deviation: u32,
    #[serde(default)]
    magic: i64,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    type_filling: FillPolicy,
}

fn default_deviation() -> u32 {
    20
}

/// `POST /order` — submit any supported order type.
pub async fn send_order(
    State(state): State<AppState>,
    body: Result<Json<OrderBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: symbol, volume, type",
        );
    };

    let mut request = if body.order_type.is_market() {
        let quote = match state.gateway.fetch_quote(body.symbol.clone()).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(symbol = %body.symbol, error = %e, "Quote fetch failed for market order");
                return error_response(StatusCode::BAD_REQUEST, "Failed to get symbol price");
            }
        };
        let price = quote.price_for(body.order_type.side());
        OrderRequest::market(body.symbol, body.order_type.side(), body.volume, price)
    } else {
        let Some(price) = body.price else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "The 'price' field is required for pending orders",
            );
        };
        let mut request = OrderRequest::pending(body.symbol, body.order_type, body.volume, price);
        if body.order_type.is_stop_limit() {
            let Some(stop_limit) = body.stoplimit else {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "The 'stoplimit' field is required for STOP_LIMIT orders",
                );
            };
            request = request.with_stop_limit(stop_limit);
        }
        request
    };

    request = request
        .with_deviation(body.deviation)
        .with_magic(body.magic)
        .with_comment(body.comment)
        .with_fill_policy(body.type_filling);
    if let Some(sl) = body.sl {
        request = request.with_sl(sl);
    }
    if let Some(tp) = body.tp {
        request = request.with_tp(tp);
    }

    Metrics::order_submitted();
    match state.gateway.submit_order(request).await {
        Ok(result) if result.is_done() => {
            info!(order = result.order, deal = result.deal, "Order executed");
            Json(json!({
                "message": "Order executed successfully",
                "result": result,
            }))
            .into_response()
        }
        Ok(result) => {
            warn!(retcode = result.retcode, comment = %result.comment, "Order not successful");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("Order failed: {}", result.comment),
                    "result": result,
                })),
            )
                .into_response()
        }
        Err(GatewayError::NoResult { code, message }) => {
            warn!(code, message = %message, "Order send returned no result");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Order send failed. The terminal returned no result.",
                    "terminal_error_code": code,
                    "terminal_error_message": message,
                })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Order send failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
