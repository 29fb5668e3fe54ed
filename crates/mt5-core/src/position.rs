//! Open-position snapshot types.
//!
//! A [`Position`] is a read snapshot fetched from the terminal at dispatch
//! time; the terminal remains the owner of position state.

use crate::decimal::{Price, Volume};
use crate::order::OrderSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position ticket: unique integer identifier, never reused by the terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticket(pub u64);

impl Ticket {
    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Ticket {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Snapshot of an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Position ticket.
    pub ticket: Ticket,
    /// Instrument name.
    pub symbol: String,
    /// Position side (buy = long, sell = short).
    pub side: OrderSide,
    /// Position volume in lots.
    pub volume: Volume,
    /// Open price.
    #[serde(default)]
    pub price_open: Price,
    /// Stop-loss level; zero when unset.
    #[serde(default)]
    pub sl: Price,
    /// Take-profit level; zero when unset.
    #[serde(default)]
    pub tp: Price,
    /// Current market price of the instrument.
    #[serde(default)]
    pub price_current: Price,
    /// Accrued swap.
    #[serde(default)]
    pub swap: Price,
    /// Floating profit.
    #[serde(default)]
    pub profit: Price,
    /// Caller-defined grouping tag.
    #[serde(default)]
    pub magic: i64,
    /// Comment attached when the position was opened.
    #[serde(default)]
    pub comment: String,
    /// Open time.
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
}

impl Position {
    /// Side of the order that closes this position.
    pub fn closing_side(&self) -> OrderSide {
        self.side.opposite()
    }
}

/// Filter for open-position lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionFilter {
    /// Restrict to positions carrying this magic tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic: Option<i64>,
}

impl PositionFilter {
    /// Match every open position.
    pub fn all() -> Self {
        Self { magic: None }
    }

    /// Match positions with the given magic tag.
    pub fn magic(magic: i64) -> Self {
        Self { magic: Some(magic) }
    }

    /// Whether the given position passes this filter.
    pub fn matches(&self, position: &Position) -> bool {
        match self.magic {
            Some(magic) => position.magic == magic,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_position(ticket: u64, magic: i64) -> Position {
        Position {
            ticket: Ticket(ticket),
            symbol: "EURUSD".to_string(),
            side: OrderSide::Buy,
            volume: Volume::new(dec!(1.0)),
            price_open: Price::new(dec!(1.0950)),
            sl: Price::ZERO,
            tp: Price::ZERO,
            price_current: Price::new(dec!(1.1000)),
            swap: Price::ZERO,
            profit: Price::new(dec!(50.0)),
            magic,
            comment: String::new(),
            time: Utc::now(),
        }
    }

    #[test]
    fn test_closing_side_is_opposite() {
        let mut position = sample_position(1, 0);
        assert_eq!(position.closing_side(), OrderSide::Sell);
        position.side = OrderSide::Sell;
        assert_eq!(position.closing_side(), OrderSide::Buy);
    }

    #[test]
    fn test_filter_matches_magic() {
        let position = sample_position(1, 42);
        assert!(PositionFilter::all().matches(&position));
        assert!(PositionFilter::magic(42).matches(&position));
        assert!(!PositionFilter::magic(7).matches(&position));
    }
}
