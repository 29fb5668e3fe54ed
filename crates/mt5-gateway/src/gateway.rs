//! Terminal gateway trait.
//!
//! Provides a trait-based abstraction over the terminal connection. This
//! allows for:
//! - Dependency injection for testing
//! - Separation of request translation from transport
//! - A single shared handle with explicit lifecycle instead of a
//!   module-level terminal global

use std::pin::Pin;
use std::sync::Arc;

use mt5_core::{AccountInfo, OrderRequest, OrderResult, Position, PositionFilter, Quote, Ticket};

use crate::error::GatewayResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Operations the service needs from the trading terminal.
///
/// The terminal connection is a single shared resource; implementations are
/// expected to tolerate concurrent calls (the batch dispatcher issues one
/// call per in-flight close). Deployments whose terminal cannot, cap the
/// dispatcher instead.
pub trait TerminalGateway: Send + Sync {
    /// Fetch all open positions passing the filter.
    fn fetch_open_positions(
        &self,
        filter: PositionFilter,
    ) -> BoxFuture<'_, GatewayResult<Vec<Position>>>;

    /// Fetch one open position by ticket; `None` when no such position is
    /// open (closed or never existed).
    fn fetch_position(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<Option<Position>>>;

    /// Fetch the current quote for a symbol.
    fn fetch_quote(&self, symbol: String) -> BoxFuture<'_, GatewayResult<Quote>>;

    /// Submit a trade request. A missing result structure surfaces as
    /// [`GatewayError::NoResult`](crate::GatewayError::NoResult), not as a
    /// success with an empty payload.
    fn submit_order(&self, request: OrderRequest) -> BoxFuture<'_, GatewayResult<OrderResult>>;

    /// Fetch the trading account snapshot.
    fn fetch_account_info(&self) -> BoxFuture<'_, GatewayResult<AccountInfo>>;

    /// Total number of open positions.
    fn positions_total(&self) -> BoxFuture<'_, GatewayResult<u64>>;
}

/// Arc wrapper for TerminalGateway trait objects.
pub type DynGateway = Arc<dyn TerminalGateway>;
