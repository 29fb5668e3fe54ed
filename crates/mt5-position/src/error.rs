//! Error taxonomy for batch closing.
//!
//! Per-item errors live in [`CloseError`] and are carried inside close
//! outcomes; they never propagate out of the dispatcher. [`BatchError`] is
//! the only batch-level failure.

use mt5_gateway::GatewayError;
use thiserror::Error;

/// Why one close attempt failed.
///
/// Display strings are user-visible: they end up verbatim in the `failed`
/// lists of the HTTP responses.
#[derive(Debug, Clone, Error)]
pub enum CloseError {
    /// The ticket does not reference a currently open position.
    #[error("Position not found.")]
    PositionNotFound,

    /// The terminal could not supply a quote for the position's symbol.
    #[error("Failed to get price for symbol {symbol}")]
    QuoteUnavailable { symbol: String },

    /// Order submission returned no result structure.
    #[error("order_send returned no result")]
    NoResult,

    /// The terminal returned a non-done status code.
    #[error("{comment} (retcode {retcode})")]
    Rejected { retcode: u32, comment: String },

    /// Gateway failure during the attempt.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The close task itself did not complete.
    #[error("close task did not complete: {0}")]
    Task(String),
}

impl CloseError {
    /// Stable label for the failure-reason metric.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::PositionNotFound => "position_not_found",
            Self::QuoteUnavailable { .. } => "quote_unavailable",
            Self::NoResult => "no_result",
            Self::Rejected { .. } => "rejected",
            Self::Gateway(_) => "gateway",
            Self::Task(_) => "task",
        }
    }
}

/// Batch-level failure: the whole dispatch aborts before any item runs.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The upfront open-position fetch failed; no partial list is
    /// acceptable, so nothing was dispatched.
    #[error("positions_get failed: {0}")]
    PositionFetchFailed(#[source] GatewayError),
}
