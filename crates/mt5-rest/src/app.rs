//! Application wiring and lifecycle.
//!
//! Lifecycle: connect the terminal bridge, serve HTTP until a shutdown
//! signal, then shut the terminal connection down. The gateway handle is
//! created here and injected everywhere else.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use mt5_gateway::{BridgeClient, DynGateway};
use mt5_server::{ApiConfig, AppState};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> AppResult<()> {
        let bridge = Arc::new(BridgeClient::new(self.config.bridge.clone())?);
        bridge.connect().await?;

        let gateway: DynGateway = bridge.clone();
        let state = AppState::new(
            gateway,
            self.config.close.profiles(),
            self.config.batch.into(),
            ApiConfig {
                api_token: self.config.server.api_token.clone(),
            },
        );

        let ip = self
            .config
            .server
            .host
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid listen host: {e}")))?;
        let addr = SocketAddr::new(ip, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let result = mt5_server::serve(listener, state, shutdown_signal()).await;

        bridge.shutdown().await;
        result.map_err(AppError::Io)
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
