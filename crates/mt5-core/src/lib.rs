//! Core domain types for the MT5 REST bridge.
//!
//! This crate provides the fundamental types shared across the service:
//! - `Ticket`: unique identifier of an open position
//! - `Price`, `Volume`: precision-safe numeric types
//! - `Position`, `Quote`, `AccountInfo`: terminal state snapshots
//! - `OrderRequest`, `OrderResult`: trade request/response pair

pub mod account;
pub mod decimal;
pub mod order;
pub mod position;
pub mod quote;

pub use account::AccountInfo;
pub use decimal::{Price, Volume};
pub use order::{
    retcode, FillPolicy, OrderRequest, OrderResult, OrderSide, OrderType, TimeInForce, TradeAction,
};
pub use position::{Position, PositionFilter, Ticket};
pub use quote::Quote;
