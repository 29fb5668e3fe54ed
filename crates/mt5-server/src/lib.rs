//! HTTP API surface for the MT5 REST bridge.
//!
//! Thin translation layer: handlers validate the request, call the gateway
//! or the batch dispatcher, and map results onto the service's JSON shapes
//! and status codes. No trading logic lives here.

pub mod auth;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_router, serve};
pub use state::{ApiConfig, AppState, CloseProfiles};
