//! Per-position close execution.
//!
//! One [`PositionCloser`] invocation performs at most two gateway round
//! trips (quote fetch, order submission) and issues exactly one close
//! attempt. There are no retries here; the dispatcher treats every attempt
//! as final.

use std::sync::Arc;

use tracing::{info, warn};

use mt5_core::{FillPolicy, OrderRequest, OrderResult, Position, Ticket, TimeInForce};
use mt5_gateway::{DynGateway, GatewayError};
use mt5_telemetry::Metrics;

use crate::error::CloseError;

/// How the magic tag on a close order is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicPolicy {
    /// Reuse the position's own magic tag.
    Inherit,
    /// Use a fixed tag (batch closes tag with 0 so they group together).
    Fixed(i64),
}

/// Knobs for building the closing order.
///
/// The per-endpoint defaults differ on purpose: they mirror the values the
/// service has always used, and deployments override them in config rather
/// than in code.
#[derive(Debug, Clone)]
pub struct CloseConfig {
    /// Allowed price deviation in points.
    pub deviation: u32,
    /// Comment attached to the closing order.
    pub comment: String,
    /// Time-in-force for the closing order.
    pub time_in_force: TimeInForce,
    /// Filling policy for the closing order.
    pub fill_policy: FillPolicy,
    /// Magic tag policy.
    pub magic: MagicPolicy,
}

impl CloseConfig {
    /// Defaults for single closes and close-all: small deviation, IOC,
    /// magic inherited from the position.
    pub fn close_all() -> Self {
        Self {
            deviation: 10,
            comment: "Closed by API".to_string(),
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
            magic: MagicPolicy::Inherit,
        }
    }

    /// Defaults for explicit-ticket batches: wider deviation, FOK,
    /// neutral magic.
    pub fn batch() -> Self {
        Self {
            deviation: 20,
            comment: "Batch Close".to_string(),
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Fok,
            magic: MagicPolicy::Fixed(0),
        }
    }
}

impl Default for CloseConfig {
    fn default() -> Self {
        Self::close_all()
    }
}

/// Result of one close attempt. Write-once; collected by the dispatcher.
#[derive(Debug, Clone)]
pub enum CloseOutcome {
    /// The terminal executed the closing deal.
    Closed {
        ticket: Ticket,
        result: OrderResult,
    },
    /// The attempt failed; the batch continues without this item.
    Failed {
        ticket: Ticket,
        symbol: Option<String>,
        error: CloseError,
        result: Option<OrderResult>,
    },
}

impl CloseOutcome {
    /// Ticket this outcome belongs to.
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Closed { ticket, .. } | Self::Failed { ticket, .. } => *ticket,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Closes a single position through the gateway.
#[derive(Clone)]
pub struct PositionCloser {
    gateway: DynGateway,
    config: Arc<CloseConfig>,
}

impl PositionCloser {
    pub fn new(gateway: DynGateway, config: CloseConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
        }
    }

    /// The configuration this closer builds requests from.
    pub fn config(&self) -> &CloseConfig {
        &self.config
    }

    /// Close by bare ticket: re-fetch the snapshot first. A ticket that is
    /// no longer open (already closed, or never existed) fails with
    /// `PositionNotFound` for this item alone.
    pub async fn close_ticket(&self, ticket: Ticket) -> CloseOutcome {
        match self.gateway.fetch_position(ticket).await {
            Ok(Some(position)) => self.close_position(&position).await,
            Ok(None) => {
                warn!(%ticket, "Attempted to close non-existent position");
                fail(ticket, None, CloseError::PositionNotFound, None)
            }
            Err(e) => {
                warn!(%ticket, error = %e, "Position lookup failed");
                fail(ticket, None, CloseError::Gateway(e), None)
            }
        }
    }

    /// Close from a snapshot fetched at dispatch time.
    pub async fn close_position(&self, position: &Position) -> CloseOutcome {
        let ticket = position.ticket;
        let symbol = position.symbol.clone();
        let side = position.closing_side();

        let quote = match self.gateway.fetch_quote(symbol.clone()).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(%ticket, symbol = %symbol, error = %e, "Quote fetch failed, cannot close");
                return fail(
                    ticket,
                    Some(symbol.clone()),
                    CloseError::QuoteUnavailable { symbol },
                    None,
                );
            }
        };
        let price = quote.price_for(side);

        let magic = match self.config.magic {
            MagicPolicy::Inherit => position.magic,
            MagicPolicy::Fixed(magic) => magic,
        };
        let request = OrderRequest::close(ticket, symbol.clone(), side, position.volume, price)
            .with_deviation(self.config.deviation)
            .with_magic(magic)
            .with_comment(self.config.comment.clone())
            .with_time_in_force(self.config.time_in_force)
            .with_fill_policy(self.config.fill_policy);

        Metrics::order_submitted();
        match self.gateway.submit_order(request).await {
            Ok(result) if result.is_done() => {
                info!(%ticket, symbol = %symbol, %price, "Position closed");
                Metrics::position_closed();
                CloseOutcome::Closed { ticket, result }
            }
            Ok(result) => {
                warn!(
                    %ticket,
                    retcode = result.retcode,
                    comment = %result.comment,
                    "Close order not executed"
                );
                let error = CloseError::Rejected {
                    retcode: result.retcode,
                    comment: result.comment.clone(),
                };
                fail(ticket, Some(symbol), error, Some(result))
            }
            Err(GatewayError::NoResult { code, message }) => {
                warn!(%ticket, code, message = %message, "order_send returned no result");
                fail(ticket, Some(symbol), CloseError::NoResult, None)
            }
            Err(e) => {
                warn!(%ticket, error = %e, "Close submission failed");
                fail(ticket, Some(symbol), CloseError::Gateway(e), None)
            }
        }
    }
}

/// Build a failed outcome and record it in the failure metric.
fn fail(
    ticket: Ticket,
    symbol: Option<String>,
    error: CloseError,
    result: Option<OrderResult>,
) -> CloseOutcome {
    Metrics::close_failed(error.reason_label());
    CloseOutcome::Failed {
        ticket,
        symbol,
        error,
        result,
    }
}
