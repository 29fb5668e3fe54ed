//! Position endpoints, including the two batch-close operations.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use mt5_core::{OrderRequest, OrderResult, Position, PositionFilter, Price, Ticket};
use mt5_gateway::GatewayError;
use mt5_position::{BatchReport, CloseOutcome};

use super::error_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MagicParams {
    magic: Option<i64>,
}

/// `GET /get_positions` — open positions, optionally filtered by magic.
pub async fn get_positions(
    State(state): State<AppState>,
    Query(params): Query<MagicParams>,
) -> Response {
    let filter = PositionFilter {
        magic: params.magic,
    };
    match state.gateway.fetch_open_positions(filter).await {
        Ok(positions) => Json(json!({ "positions": positions })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to retrieve positions");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve positions")
        }
    }
}

/// `GET /positions_total` — number of open positions.
pub async fn positions_total(State(state): State<AppState>) -> Response {
    match state.gateway.positions_total().await {
        Ok(total) => Json(json!({ "total": total })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to get positions total");
            error_response(StatusCode::BAD_REQUEST, "Failed to get positions total")
        }
    }
}

/// `POST /close_position` body: a full position snapshot, or just a ticket
/// to have the snapshot re-fetched.
#[derive(Debug, Deserialize)]
pub struct ClosePositionBody {
    position: Option<Position>,
    ticket: Option<u64>,
}

/// `POST /close_position` — close one position.
pub async fn close_position(
    State(state): State<AppState>,
    body: Result<Json<ClosePositionBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Position data is required");
    };

    let outcome = if let Some(position) = body.position {
        state.single_closer.close_position(&position).await
    } else if let Some(ticket) = body.ticket {
        state.single_closer.close_ticket(Ticket(ticket)).await
    } else {
        return error_response(StatusCode::BAD_REQUEST, "Position data is required");
    };

    match outcome {
        CloseOutcome::Closed { result, .. } => Json(json!({
            "message": "Position closed successfully",
            "result": result,
        }))
        .into_response(),
        CloseOutcome::Failed { error, result, .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Failed to close position: {error}"),
                "result": result,
            })),
        )
            .into_response(),
    }
}

/// `POST /modify_sl_tp` body. Zero (or omitted) levels remove the
/// corresponding stop.
#[derive(Debug, Deserialize)]
pub struct ModifySlTpBody {
    position: u64,
    sl: Option<Price>,
    tp: Option<Price>,
}

/// `POST /modify_sl_tp` — change stop-loss / take-profit of a position.
pub async fn modify_sl_tp(
    State(state): State<AppState>,
    body: Result<Json<ModifySlTpBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "The 'position' ticket number is required");
    };
    let ticket = Ticket(body.position);

    let position = match state.gateway.fetch_position(ticket).await {
        Ok(Some(position)) => position,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Position with ticket {ticket} not found."),
            );
        }
        Err(e) => {
            warn!(%ticket, error = %e, "Position lookup failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let request = OrderRequest::modify_sltp(
        ticket,
        position.symbol,
        body.sl.unwrap_or(Price::ZERO),
        body.tp.unwrap_or(Price::ZERO),
    );

    match state.gateway.submit_order(request).await {
        Ok(result) if result.is_done() => Json(json!({
            "message": "SL/TP modified successfully",
            "result": result,
        }))
        .into_response(),
        Ok(result) => {
            warn!(%ticket, comment = %result.comment, "SL/TP modification not successful");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("Failed to modify SL/TP: {}", result.comment),
                    "result": result,
                })),
            )
                .into_response()
        }
        Err(GatewayError::NoResult { code, message }) => {
            warn!(%ticket, code, message = %message, "SL/TP modification returned no result");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Failed to modify SL/TP. The terminal returned no result.",
                    "terminal_error_code": code,
                    "terminal_error_message": message,
                })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(%ticket, error = %e, "SL/TP modification failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `/close_all_positions` failure item: ticket plus the failure text, with
/// the symbol when one was resolved.
#[derive(Debug, Serialize)]
struct CloseAllFailure {
    ticket: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    error: String,
}

#[derive(Debug, Serialize)]
struct CloseAllResponse {
    closed: Vec<u64>,
    failed: Vec<CloseAllFailure>,
}

impl CloseAllResponse {
    fn from_report(report: BatchReport) -> Self {
        Self {
            closed: report
                .closed_tickets()
                .into_iter()
                .map(|ticket| ticket.inner())
                .collect(),
            failed: report
                .failed
                .into_iter()
                .map(|f| CloseAllFailure {
                    ticket: f.ticket.inner(),
                    symbol: f.symbol,
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// `POST /close_all_positions` — close every open position, optionally
/// filtered by magic. Partial failure is still a 200; only the upfront
/// position-list fetch is a 500.
pub async fn close_all_positions(
    State(state): State<AppState>,
    Query(params): Query<MagicParams>,
) -> Response {
    let filter = PositionFilter {
        magic: params.magic,
    };
    match state.close_all.close_all(filter).await {
        Ok(report) => Json(CloseAllResponse::from_report(report)).into_response(),
        Err(e) => {
            warn!(error = %e, "close_all_positions aborted");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchCloseBody {
    tickets: Vec<u64>,
}

#[derive(Debug, Serialize)]
struct SuccessfulClose {
    ticket: u64,
    result: OrderResult,
}

#[derive(Debug, Serialize)]
struct FailedClose {
    ticket: u64,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<OrderResult>,
}

#[derive(Debug, Serialize)]
struct BatchCloseResponse {
    message: String,
    successful_closes: Vec<SuccessfulClose>,
    failed_closes: Vec<FailedClose>,
}

impl BatchCloseResponse {
    fn from_report(report: BatchReport) -> Self {
        Self {
            message: "Batch close operation completed.".to_string(),
            successful_closes: report
                .closed
                .into_iter()
                .map(|c| SuccessfulClose {
                    ticket: c.ticket.inner(),
                    result: c.result,
                })
                .collect(),
            failed_closes: report
                .failed
                .into_iter()
                .map(|f| FailedClose {
                    ticket: f.ticket.inner(),
                    error: f.error.to_string(),
                    result: f.result,
                })
                .collect(),
        }
    }
}

/// `POST /close_positions_batch` — close an explicit list of tickets.
/// Always completes with a 200 and both partitions; a malformed body is the
/// only 400.
pub async fn close_positions_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchCloseBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "A JSON array of 'tickets' is required.");
    };

    let tickets = body.tickets.into_iter().map(Ticket).collect();
    let report = state.batch.close_tickets(tickets).await;
    Json(BatchCloseResponse::from_report(report)).into_response()
}
