//! Terminal gateway seam for the MT5 REST bridge.
//!
//! Everything the service knows about the trading terminal goes through the
//! [`TerminalGateway`] trait: position lookup, quote lookup, order
//! submission, account state. The trait has two implementations:
//! - [`BridgeClient`]: HTTP client for the local terminal bridge
//! - [`MockGateway`]: scripted in-memory gateway for tests

pub mod bridge;
pub mod error;
pub mod gateway;
pub mod mock;

pub use bridge::{BridgeClient, BridgeConfig};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{BoxFuture, DynGateway, TerminalGateway};
pub use mock::MockGateway;
