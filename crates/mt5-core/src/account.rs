//! Trading account snapshot.

use crate::decimal::Price;
use serde::{Deserialize, Serialize};

/// Account state reported by the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account login number.
    pub login: i64,
    /// Account balance.
    pub balance: Price,
    /// Credit amount.
    #[serde(default)]
    pub credit: Price,
    /// Current floating profit.
    #[serde(default)]
    pub profit: Price,
    /// Equity (balance + floating profit).
    pub equity: Price,
    /// Margin currently in use.
    #[serde(default)]
    pub margin: Price,
    /// Free margin.
    #[serde(default)]
    pub margin_free: Price,
    /// Margin level in percent.
    #[serde(default)]
    pub margin_level: Price,
    /// Account leverage.
    #[serde(default)]
    pub leverage: i64,
    /// Whether trading is allowed on this account.
    #[serde(default)]
    pub trade_allowed: bool,
    /// Deposit currency.
    #[serde(default)]
    pub currency: String,
    /// Account holder name.
    #[serde(default)]
    pub name: String,
    /// Trade server name.
    #[serde(default)]
    pub server: String,
    /// Broker company name.
    #[serde(default)]
    pub company: String,
}
