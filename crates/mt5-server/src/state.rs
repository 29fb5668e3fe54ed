//! Shared application state for axum handlers.

use std::sync::Arc;

use mt5_gateway::DynGateway;
use mt5_position::{BatchDispatcher, CloseConfig, DispatchConfig, PositionCloser};

/// API-level configuration.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Bearer token required on non-public routes. `None` disables the
    /// check (local development).
    pub api_token: Option<String>,
}

/// Close configuration per endpoint.
///
/// The three endpoints have always used different deviation/filling/magic
/// values; they stay independent knobs instead of being unified.
#[derive(Debug, Clone)]
pub struct CloseProfiles {
    /// `POST /close_position`.
    pub single: CloseConfig,
    /// `POST /close_all_positions`.
    pub all: CloseConfig,
    /// `POST /close_positions_batch`.
    pub batch: CloseConfig,
}

impl Default for CloseProfiles {
    fn default() -> Self {
        Self {
            single: CloseConfig::close_all(),
            all: CloseConfig::close_all(),
            batch: CloseConfig::batch(),
        }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: DynGateway,
    /// Closer used by the single-position endpoint.
    pub single_closer: PositionCloser,
    /// Dispatcher for `/close_all_positions`.
    pub close_all: Arc<BatchDispatcher>,
    /// Dispatcher for `/close_positions_batch`.
    pub batch: Arc<BatchDispatcher>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        gateway: DynGateway,
        profiles: CloseProfiles,
        dispatch: DispatchConfig,
        config: ApiConfig,
    ) -> Self {
        let single_closer = PositionCloser::new(gateway.clone(), profiles.single);
        let close_all = Arc::new(BatchDispatcher::new(
            gateway.clone(),
            PositionCloser::new(gateway.clone(), profiles.all),
            dispatch,
        ));
        let batch = Arc::new(BatchDispatcher::new(
            gateway.clone(),
            PositionCloser::new(gateway.clone(), profiles.batch),
            dispatch,
        ));
        Self {
            gateway,
            single_closer,
            close_all,
            batch,
            config,
        }
    }
}
