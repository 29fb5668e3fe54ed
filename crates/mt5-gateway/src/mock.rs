//! Scripted in-memory gateway for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use mt5_core::{
    retcode, AccountInfo, OrderRequest, OrderResult, Position, PositionFilter, Price, Quote,
    Ticket,
};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, TerminalGateway};

/// Mock terminal gateway.
///
/// Holds a canned set of open positions and quotes, records every submitted
/// order, and lets tests script submission results. Unscripted submissions
/// succeed with a synthesized "done" result echoing the request.
///
/// The in-flight high-water mark makes the dispatcher's concurrency cap
/// observable: pair it with [`MockGateway::set_submit_delay`] so sibling
/// submissions overlap.
pub struct MockGateway {
    positions: Mutex<Vec<Position>>,
    quotes: Mutex<HashMap<String, Quote>>,
    failed_quotes: Mutex<HashSet<String>>,
    scripted_results: Mutex<VecDeque<GatewayResult<OrderResult>>>,
    submissions: Mutex<Vec<OrderRequest>>,
    fail_position_fetch: AtomicBool,
    account: Mutex<AccountInfo>,
    submit_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_deal: AtomicU64,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create an empty mock gateway.
    pub fn new() -> Self {
        Self {
            positions: Mutex::new(Vec::new()),
            quotes: Mutex::new(HashMap::new()),
            failed_quotes: Mutex::new(HashSet::new()),
            scripted_results: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            fail_position_fetch: AtomicBool::new(false),
            account: Mutex::new(AccountInfo {
                login: 0,
                balance: Price::ZERO,
                credit: Price::ZERO,
                profit: Price::ZERO,
                equity: Price::ZERO,
                margin: Price::ZERO,
                margin_free: Price::ZERO,
                margin_level: Price::ZERO,
                leverage: 0,
                trade_allowed: false,
                currency: String::new(),
                name: String::new(),
                server: String::new(),
                company: String::new(),
            }),
            submit_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            next_deal: AtomicU64::new(1),
        }
    }

    /// Seed the open-position set.
    pub fn with_positions(self, positions: Vec<Position>) -> Self {
        *self.positions.lock() = positions;
        self
    }

    /// Set the quote returned for a symbol.
    pub fn set_quote(&self, symbol: impl Into<String>, quote: Quote) {
        self.quotes.lock().insert(symbol.into(), quote);
    }

    /// Make quote lookups for a symbol fail.
    pub fn fail_quote(&self, symbol: impl Into<String>) {
        self.failed_quotes.lock().insert(symbol.into());
    }

    /// Script the next order submission result. Scripted results are
    /// consumed in FIFO order before the synthesized default kicks in.
    pub fn push_order_result(&self, result: GatewayResult<OrderResult>) {
        self.scripted_results.lock().push_back(result);
    }

    /// Make the upfront open-position fetch fail.
    pub fn set_fail_position_fetch(&self, fail: bool) {
        self.fail_position_fetch.store(fail, Ordering::SeqCst);
    }

    /// Set the account snapshot.
    pub fn set_account(&self, account: AccountInfo) {
        *self.account.lock() = account;
    }

    /// Delay every submission, so concurrent submissions overlap.
    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock() = Some(delay);
    }

    /// Recorded order submissions.
    pub fn submissions(&self) -> Vec<OrderRequest> {
        self.submissions.lock().clone()
    }

    /// Highest number of submissions that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn synthesize_result(&self, request: &OrderRequest) -> OrderResult {
        let deal = self.next_deal.fetch_add(1, Ordering::SeqCst);
        OrderResult {
            retcode: retcode::DONE,
            deal,
            order: deal,
            volume: request.volume.unwrap_or_default(),
            price: request.price.unwrap_or_default(),
            bid: Price::ZERO,
            ask: Price::ZERO,
            comment: "Request executed".to_string(),
            request_id: deal as u32,
        }
    }
}

impl TerminalGateway for MockGateway {
    fn fetch_open_positions(
        &self,
        filter: PositionFilter,
    ) -> BoxFuture<'_, GatewayResult<Vec<Position>>> {
        Box::pin(async move {
            if self.fail_position_fetch.load(Ordering::SeqCst) {
                return Err(GatewayError::Transport("positions_get failed".to_string()));
            }
            Ok(self
                .positions
                .lock()
                .iter()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect())
        })
    }

    fn fetch_position(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<Option<Position>>> {
        Box::pin(async move {
            Ok(self
                .positions
                .lock()
                .iter()
                .find(|p| p.ticket == ticket)
                .cloned())
        })
    }

    fn fetch_quote(&self, symbol: String) -> BoxFuture<'_, GatewayResult<Quote>> {
        Box::pin(async move {
            if self.failed_quotes.lock().contains(&symbol) {
                return Err(GatewayError::QuoteUnavailable { symbol });
            }
            self.quotes
                .lock()
                .get(&symbol)
                .copied()
                .ok_or(GatewayError::QuoteUnavailable { symbol })
        })
    }

    fn submit_order(&self, request: OrderRequest) -> BoxFuture<'_, GatewayResult<OrderResult>> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = *self.submit_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            self.submissions.lock().push(request.clone());
            let result = self
                .scripted_results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(self.synthesize_result(&request)));

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }

    fn fetch_account_info(&self) -> BoxFuture<'_, GatewayResult<AccountInfo>> {
        Box::pin(async move { Ok(self.account.lock().clone()) })
    }

    fn positions_total(&self) -> BoxFuture<'_, GatewayResult<u64>> {
        Box::pin(async move { Ok(self.positions.lock().len() as u64) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt5_core::{OrderSide, Volume};
    use rust_decimal_macros::dec;

    fn sample_position(ticket: u64) -> Position {
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
            profit: Price::ZERO,
            magic: 0,
            comment: String::new(),
            time: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_mock_records_submissions() {
        let gateway = MockGateway::new();
        let request = OrderRequest::market(
            "EURUSD",
            OrderSide::Sell,
            Volume::new(dec!(1.0)),
            Price::new(dec!(1.1000)),
        );

        let result = gateway.submit_order(request).await.unwrap();
        assert!(result.is_done());
        assert_eq!(result.price, Price::new(dec!(1.1000)));
        assert_eq!(gateway.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_result_consumed_first() {
        let gateway = MockGateway::new();
        gateway.push_order_result(Err(GatewayError::NoResult {
            code: -1,
            message: "down".to_string(),
        }));

        let request = OrderRequest::market(
            "EURUSD",
            OrderSide::Sell,
            Volume::new(dec!(1.0)),
            Price::new(dec!(1.1000)),
        );
        assert!(gateway.submit_order(request.clone()).await.is_err());
        assert!(gateway.submit_order(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_position_lookup() {
        let gateway = MockGateway::new().with_positions(vec![sample_position(101)]);
        assert!(gateway.fetch_position(Ticket(101)).await.unwrap().is_some());
        assert!(gateway.fetch_position(Ticket(102)).await.unwrap().is_none());
        assert_eq!(gateway.positions_total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_quote_failure() {
        let gateway = MockGateway::new();
        gateway.set_quote(
            "EURUSD",
            Quote::new(Price::new(dec!(1.1000)), Price::new(dec!(1.1002))),
        );
        gateway.fail_quote("GBPUSD");

        assert!(gateway.fetch_quote("EURUSD".to_string()).await.is_ok());
        assert!(matches!(
            gateway.fetch_quote("GBPUSD".to_string()).await,
            Err(GatewayError::QuoteUnavailable { .. })
        ));
        assert!(gateway.fetch_quote("USDJPY".to_string()).await.is_err());
    }
}
