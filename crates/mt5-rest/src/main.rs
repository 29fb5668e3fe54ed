//! MT5 REST bridge - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// HTTP facade over a MetaTrader 5 trading terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MT5_REST_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    mt5_telemetry::init_logging()?;

    info!("Starting MT5 REST bridge v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > MT5_REST_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("MT5_REST_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = mt5_rest::AppConfig::load(&config_path)?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        bridge_url = %config.bridge.url,
        "Configuration loaded"
    );

    let app = mt5_rest::Application::new(config);
    app.run().await?;

    Ok(())
}
