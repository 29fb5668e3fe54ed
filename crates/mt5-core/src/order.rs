//! Order-related types: sides, order kinds, execution policies, and the
//! trade request/response pair exchanged with the terminal.
//!
//! Wire field names (`type_time`, `type_filling`, `stoplimit`, ...) match the
//! terminal's native request dictionary so the bridge can forward requests
//! without translation.

use crate::decimal::{Price, Volume};
use crate::position::Ticket;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side. Closing a position submits an order on
    /// the opposite side of the position.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Terminal order type, covering market, pending, and stop-limit orders.
///
/// The serialized form matches the public API strings (`"BUY"`,
/// `"SELL_STOP_LIMIT"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Buy,
    Sell,
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
    BuyStopLimit,
    SellStopLimit,
}

impl OrderType {
    /// Market orders execute at the current quote.
    pub fn is_market(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }

    /// Stop-limit orders require an additional trigger price.
    pub fn is_stop_limit(&self) -> bool {
        matches!(self, Self::BuyStopLimit | Self::SellStopLimit)
    }

    /// The side this order trades on.
    pub fn side(&self) -> OrderSide {
        match self {
            Self::Buy | Self::BuyLimit | Self::BuyStop | Self::BuyStopLimit => OrderSide::Buy,
            Self::Sell | Self::SellLimit | Self::SellStop | Self::SellStopLimit => OrderSide::Sell,
        }
    }

    /// Market order type for the given side.
    pub fn market(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => Self::Buy,
            OrderSide::Sell => Self::Sell,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::BuyLimit => "BUY_LIMIT",
            Self::SellLimit => "SELL_LIMIT",
            Self::BuyStop => "BUY_STOP",
            Self::SellStop => "SELL_STOP",
            Self::BuyStopLimit => "BUY_STOP_LIMIT",
            Self::SellStopLimit => "SELL_STOP_LIMIT",
        };
        write!(f, "{s}")
    }
}

/// Time-in-force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good-til-cancelled (the terminal default for close orders).
    #[default]
    Gtc,
    /// Valid for the current trading day.
    Day,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gtc => write!(f, "gtc"),
            Self::Day => write!(f, "day"),
        }
    }
}

/// Order filling policy.
///
/// Accepts both the short form (`"ioc"`) and the terminal constant name
/// (`"ORDER_FILLING_IOC"`) on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    /// Immediate-or-cancel: fill what is available, cancel the rest.
    #[default]
    #[serde(alias = "ORDER_FILLING_IOC")]
    Ioc,
    /// Fill-or-kill: fill the full volume or reject.
    #[serde(alias = "ORDER_FILLING_FOK")]
    Fok,
    /// Book the unfilled remainder as a limit order.
    #[serde(alias = "ORDER_FILLING_RETURN")]
    Return,
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ioc => write!(f, "ioc"),
            Self::Fok => write!(f, "fok"),
            Self::Return => write!(f, "return"),
        }
    }
}

/// Trade action selector for an [`OrderRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    /// Immediate execution against the market (market orders, closes).
    Deal,
    /// Place a pending order.
    Pending,
    /// Modify stop-loss / take-profit of an open position.
    Sltp,
}

/// A trade request submitted to the terminal.
///
/// Field names mirror the terminal's request dictionary; optional fields are
/// omitted from the wire when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub action: TradeAction,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Volume>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(rename = "stoplimit", skip_serializing_if = "Option::is_none")]
    pub stop_limit: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<u32>,
    #[serde(default)]
    pub magic: i64,
    #[serde(default)]
    pub comment: String,
    /// Ticket of the position this order acts on (closes and SL/TP edits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Ticket>,
    #[serde(rename = "type_time", default)]
    pub time_in_force: TimeInForce,
    #[serde(rename = "type_filling", default)]
    pub fill_policy: FillPolicy,
}

impl OrderRequest {
    /// Market order executed immediately at the given price.
    pub fn market(
        symbol: impl Into<String>,
        side: OrderSide,
        volume: Volume,
        price: Price,
    ) -> Self {
        Self {
            action: TradeAction::Deal,
            symbol: symbol.into(),
            volume: Some(volume),
            order_type: Some(OrderType::market(side)),
            price: Some(price),
            stop_limit: None,
            sl: None,
            tp: None,
            deviation: None,
            magic: 0,
            comment: String::new(),
            position: None,
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
        }
    }

    /// Pending order resting at the given price.
    pub fn pending(
        symbol: impl Into<String>,
        order_type: OrderType,
        volume: Volume,
        price: Price,
    ) -> Self {
        Self {
            action: TradeAction::Pending,
            symbol: symbol.into(),
            volume: Some(volume),
            order_type: Some(order_type),
            price: Some(price),
            stop_limit: None,
            sl: None,
            tp: None,
            deviation: None,
            magic: 0,
            comment: String::new(),
            position: None,
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
        }
    }

    /// Deal closing an open position: opposite side, full volume, execution
    /// price resolved by the caller from the current quote.
    pub fn close(
        ticket: Ticket,
        symbol: impl Into<String>,
        side: OrderSide,
        volume: Volume,
        price: Price,
    ) -> Self {
        Self {
            action: TradeAction::Deal,
            symbol: symbol.into(),
            volume: Some(volume),
            order_type: Some(OrderType::market(side)),
            price: Some(price),
            stop_limit: None,
            sl: None,
            tp: None,
            deviation: None,
            magic: 0,
            comment: String::new(),
            position: Some(ticket),
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
        }
    }

    /// SL/TP modification for an open position. A zero price removes the
    /// corresponding level.
    pub fn modify_sltp(ticket: Ticket, symbol: impl Into<String>, sl: Price, tp: Price) -> Self {
        Self {
            action: TradeAction::Sltp,
            symbol: symbol.into(),
            volume: None,
            order_type: None,
            price: None,
            stop_limit: None,
            sl: Some(sl),
            tp: Some(tp),
            deviation: None,
            magic: 0,
            comment: String::new(),
            position: Some(ticket),
            time_in_force: TimeInForce::Gtc,
            fill_policy: FillPolicy::Ioc,
        }
    }

    pub fn with_deviation(mut self, deviation: u32) -> Self {
        self.deviation = Some(deviation);
        self
    }

    pub fn with_magic(mut self, magic: i64) -> Self {
        self.magic = magic;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_sl(mut self, sl: Price) -> Self {
        self.sl = Some(sl);
        self
    }

    pub fn with_tp(mut self, tp: Price) -> Self {
        self.tp = Some(tp);
        self
    }

    pub fn with_stop_limit(mut self, stop_limit: Price) -> Self {
        self.stop_limit = Some(stop_limit);
        self
    }

    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    pub fn with_fill_policy(mut self, policy: FillPolicy) -> Self {
        self.fill_policy = policy;
        self
    }
}

/// Terminal return codes for order submission.
pub mod retcode {
    /// Requote: the price moved before execution.
    pub const REQUOTE: u32 = 10004;
    /// Request rejected.
    pub const REJECT: u32 = 10006;
    /// Request completed.
    pub const DONE: u32 = 10009;
    /// Request partially completed.
    pub const DONE_PARTIAL: u32 = 10010;
    /// Invalid volume in the request.
    pub const INVALID_VOLUME: u32 = 10014;
    /// Market is closed.
    pub const MARKET_CLOSED: u32 = 10018;
    /// Not enough money to complete the request.
    pub const NO_MONEY: u32 = 10019;
    /// Unsupported filling policy.
    pub const INVALID_FILL: u32 = 10030;
}

/// Result of an order submission, echoed back by the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Terminal return code; [`retcode::DONE`] means executed.
    pub retcode: u32,
    /// Deal ticket, when a deal was performed.
    #[serde(default)]
    pub deal: u64,
    /// Order ticket, when an order was placed.
    #[serde(default)]
    pub order: u64,
    /// Executed volume.
    #[serde(default)]
    pub volume: Volume,
    /// Execution price.
    #[serde(default)]
    pub price: Price,
    /// Bid at execution time.
    #[serde(default)]
    pub bid: Price,
    /// Ask at execution time.
    #[serde(default)]
    pub ask: Price,
    /// Broker comment on the result.
    #[serde(default)]
    pub comment: String,
    /// Request id assigned by the terminal.
    #[serde(default)]
    pub request_id: u32,
}

impl OrderResult {
    /// Whether the request fully executed.
    pub fn is_done(&self) -> bool {
        self.retcode == retcode::DONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_order_type_strings() {
        let t: OrderType = serde_json::from_str("\"BUY_STOP_LIMIT\"").unwrap();
        assert_eq!(t, OrderType::BuyStopLimit);
        assert!(t.is_stop_limit());
        assert_eq!(serde_json::to_string(&OrderType::Sell).unwrap(), "\"SELL\"");
    }

    #[test]
    fn test_fill_policy_accepts_terminal_constants() {
        let p: FillPolicy = serde_json::from_str("\"ORDER_FILLING_FOK\"").unwrap();
        assert_eq!(p, FillPolicy::Fok);
        let p: FillPolicy = serde_json::from_str("\"ioc\"").unwrap();
        assert_eq!(p, FillPolicy::Ioc);
    }

    #[test]
    fn test_close_request_wire_names() {
        let request = OrderRequest::close(
            Ticket(101),
            "EURUSD",
            OrderSide::Sell,
            Volume::new(dec!(1.0)),
            Price::new(dec!(1.1000)),
        )
        .with_deviation(10)
        .with_comment("Closed by API");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "deal");
        assert_eq!(json["type"], "SELL");
        assert_eq!(json["position"], 101);
        assert_eq!(json["type_time"], "gtc");
        assert_eq!(json["type_filling"], "ioc");
        assert_eq!(json["deviation"], 10);
        assert!(json.get("stoplimit").is_none());
    }

    #[test]
    fn test_order_result_is_done() {
        let result = OrderResult {
            retcode: retcode::DONE,
            deal: 1,
            order: 1,
            volume: Volume::new(dec!(1.0)),
            price: Price::new(dec!(1.1)),
            bid: Price::ZERO,
            ask: Price::ZERO,
            comment: "Request executed".to_string(),
            request_id: 1,
        };
        assert!(result.is_done());

        let rejected = OrderResult {
            retcode: retcode::REJECT,
            ..result
        };
        assert!(!rejected.is_done());
    }
}
