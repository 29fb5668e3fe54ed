//! Gateway error types.
//!
//! Variants are Clone (String payloads) so per-item close outcomes can carry
//! the error they were produced from.

use thiserror::Error;

/// Errors surfaced by the terminal gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Transport-level failure reaching the terminal bridge.
    #[error("terminal bridge request failed: {0}")]
    Transport(String),

    /// The terminal reported an error for the call.
    #[error("terminal error {code}: {message}")]
    Terminal { code: i64, message: String },

    /// The terminal could not supply a tick for the symbol.
    #[error("no tick available for symbol {symbol}")]
    QuoteUnavailable { symbol: String },

    /// Order submission returned no result structure.
    #[error("order_send returned no result ({code}: {message})")]
    NoResult { code: i64, message: String },
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
