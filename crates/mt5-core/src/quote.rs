//! Current quote (tick) for an instrument.

use crate::decimal::Price;
use crate::order::OrderSide;
use serde::{Deserialize, Serialize};

/// Latest bid/ask for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid.
    pub bid: Price,
    /// Best ask.
    pub ask: Price,
}

impl Quote {
    pub fn new(bid: Price, ask: Price) -> Self {
        Self { bid, ask }
    }

    /// Execution price for an order on the given side: sells hit the bid,
    /// buys lift the ask.
    pub fn price_for(&self, side: OrderSide) -> Price {
        match side {
            OrderSide::Sell => self.bid,
            OrderSide::Buy => self.ask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_for_side() {
        let quote = Quote::new(Price::new(dec!(1.1000)), Price::new(dec!(1.1002)));
        assert_eq!(quote.price_for(OrderSide::Sell), Price::new(dec!(1.1000)));
        assert_eq!(quote.price_for(OrderSide::Buy), Price::new(dec!(1.1002)));
    }
}
