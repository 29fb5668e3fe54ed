//! HTTP client for the local terminal bridge.
//!
//! The bridge mirrors the terminal's native call surface as tagged JSON
//! commands posted to a single endpoint
//! (`{"type": "positions_get", "magic": 7}`). The client owns the
//! connection lifecycle: [`BridgeClient::connect`] before serving requests,
//! [`BridgeClient::shutdown`] on exit.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use mt5_core::{AccountInfo, OrderRequest, OrderResult, Position, PositionFilter, Quote, Ticket};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, TerminalGateway};

/// Default timeout for bridge requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bridge endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bridge command endpoint URL.
    pub url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5001/command".to_string(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Commands understood by the terminal bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BridgeCommand {
    Initialize,
    Shutdown,
    PositionsGet {
        #[serde(skip_serializing_if = "Option::is_none")]
        magic: Option<i64>,
    },
    PositionGet {
        ticket: Ticket,
    },
    SymbolInfoTick {
        symbol: String,
    },
    OrderSend {
        request: OrderRequest,
    },
    AccountInfo,
    PositionsTotal,
}

/// Terminal-side error detail (`last_error` shape).
#[derive(Debug, Default, Deserialize)]
struct TerminalFault {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    ok: bool,
    #[serde(default)]
    error: Option<TerminalFault>,
}

#[derive(Debug, Deserialize)]
struct PositionsResponse {
    positions: Vec<Position>,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    position: Option<Position>,
}

#[derive(Debug, Deserialize)]
struct TickResponse {
    tick: Option<Quote>,
}

#[derive(Debug, Deserialize)]
struct OrderSendResponse {
    result: Option<OrderResult>,
    #[serde(default)]
    last_error: Option<TerminalFault>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: AccountInfo,
}

#[derive(Debug, Deserialize)]
struct TotalResponse {
    total: u64,
}

/// HTTP client implementing [`TerminalGateway`] against the bridge.
pub struct BridgeClient {
    client: Client,
    config: BridgeConfig,
}

impl BridgeClient {
    /// Create a new bridge client.
    pub fn new(config: BridgeConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Initialize the terminal connection.
    pub async fn connect(&self) -> GatewayResult<()> {
        info!(url = %self.config.url, "Initializing terminal connection");
        let ack: AckResponse = self.post(&BridgeCommand::Initialize).await?;
        if ack.ok {
            Ok(())
        } else {
            let fault = ack.error.unwrap_or_default();
            Err(GatewayError::Terminal {
                code: fault.code,
                message: fault.message,
            })
        }
    }

    /// Shut the terminal connection down. Failures are logged, not
    /// propagated; the process is exiting anyway.
    pub async fn shutdown(&self) {
        match self.post::<AckResponse>(&BridgeCommand::Shutdown).await {
            Ok(_) => info!("Terminal connection shut down"),
            Err(e) => warn!(error = %e, "Terminal shutdown failed"),
        }
    }

    /// Post one command and decode the response body.
    async fn post<T: DeserializeOwned>(&self, command: &BridgeCommand) -> GatewayResult<T> {
        let response = self
            .client
            .post(&self.config.url)
            .json(command)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Transport(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to parse response: {e}")))
    }
}

impl TerminalGateway for BridgeClient {
    fn fetch_open_positions(
        &self,
        filter: PositionFilter,
    ) -> BoxFuture<'_, GatewayResult<Vec<Position>>> {
        Box::pin(async move {
            let response: PositionsResponse = self
                .post(&BridgeCommand::PositionsGet {
                    magic: filter.magic,
                })
                .await?;
            debug!(
                count = response.positions.len(),
                magic = ?filter.magic,
                "Fetched open positions"
            );
            Ok(response.positions)
        })
    }

    fn fetch_position(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<Option<Position>>> {
        Box::pin(async move {
            let response: PositionResponse =
                self.post(&BridgeCommand::PositionGet { ticket }).await?;
            Ok(response.position)
        })
    }

    fn fetch_quote(&self, symbol: String) -> BoxFuture<'_, GatewayResult<Quote>> {
        Box::pin(async move {
            let response: TickResponse = self
                .post(&BridgeCommand::SymbolInfoTick {
                    symbol: symbol.clone(),
                })
                .await?;
            response
                .tick
                .ok_or(GatewayError::QuoteUnavailable { symbol })
        })
    }

    fn submit_order(&self, request: OrderRequest) -> BoxFuture<'_, GatewayResult<OrderResult>> {
        Box::pin(async move {
            let response: OrderSendResponse =
                self.post(&BridgeCommand::OrderSend { request }).await?;
            match response.result {
                Some(result) => Ok(result),
                None => {
                    let fault = response.last_error.unwrap_or_default();
                    Err(GatewayError::NoResult {
                        code: fault.code,
                        message: fault.message,
                    })
                }
            }
        })
    }

    fn fetch_account_info(&self) -> BoxFuture<'_, GatewayResult<AccountInfo>> {
        Box::pin(async move {
            let response: AccountResponse = self.post(&BridgeCommand::AccountInfo).await?;
            Ok(response.account)
        })
    }

    fn positions_total(&self) -> BoxFuture<'_, GatewayResult<u64>> {
        Box::pin(async move {
            let response: TotalResponse = self.post(&BridgeCommand::PositionsTotal).await?;
            Ok(response.total)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let command = BridgeCommand::PositionsGet { magic: Some(7) };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"type":"positions_get","magic":7}"#);

        let command = BridgeCommand::PositionsGet { magic: None };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"type":"positions_get"}"#);

        let command = BridgeCommand::SymbolInfoTick {
            symbol: "EURUSD".to_string(),
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"type":"symbol_info_tick","symbol":"EURUSD"}"#);
    }

    #[test]
    fn test_order_send_response_without_result() {
        let body =
            r#"{"result": null, "last_error": {"code": -10004, "message": "No IPC connection"}}"#;
        let response: OrderSendResponse = serde_json::from_str(body).unwrap();
        assert!(response.result.is_none());
        let fault = response.last_error.unwrap();
        assert_eq!(fault.code, -10004);
        assert_eq!(fault.message, "No IPC connection");
    }
}
