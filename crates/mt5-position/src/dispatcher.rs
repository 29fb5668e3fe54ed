//! Concurrent fan-out of close attempts.
//!
//! One task per item, bounded by a semaphore. The batch body runs in a
//! task detached from the caller: a client that disconnects mid-batch stops
//! receiving the report, but submissions already in flight run to
//! completion (aborting an order submission would leave the terminal in an
//! ambiguous state).
//!
//! Invariant: every dispatched item produces exactly one outcome. Task ids
//! are tracked so even a unit that dies without returning still contributes
//! a failed outcome for its ticket.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use mt5_core::{Position, PositionFilter, Ticket};
use mt5_gateway::DynGateway;
use mt5_telemetry::Metrics;

use crate::closer::{CloseOutcome, PositionCloser};
use crate::error::{BatchError, CloseError};
use crate::report::BatchReport;

/// One unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub enum CloseItem {
    /// Snapshot fetched upfront (close-all modes).
    Snapshot(Position),
    /// Bare ticket; the closer re-fetches the snapshot (explicit-list mode).
    Lookup(Ticket),
}

impl CloseItem {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Snapshot(position) => position.ticket,
            Self::Lookup(ticket) => *ticket,
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchConfig {
    /// Maximum concurrent close attempts. `None` = one worker per item.
    /// Set to 1 for terminals that cannot take concurrent calls.
    pub max_concurrency: Option<usize>,
}

impl DispatchConfig {
    pub fn capped(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: Some(max_concurrency),
        }
    }
}

/// Fans out close attempts and collects their outcomes.
pub struct BatchDispatcher {
    gateway: DynGateway,
    closer: PositionCloser,
    config: DispatchConfig,
}

impl BatchDispatcher {
    pub fn new(gateway: DynGateway, closer: PositionCloser, config: DispatchConfig) -> Self {
        Self {
            gateway,
            closer,
            config,
        }
    }

    /// Close every open position passing the filter.
    ///
    /// The live position list is fetched once at the start; if that fetch
    /// fails the whole batch aborts with no attempts made (a partial list
    /// is not acceptable).
    pub async fn close_all(&self, filter: PositionFilter) -> Result<BatchReport, BatchError> {
        let positions = self
            .gateway
            .fetch_open_positions(filter)
            .await
            .map_err(BatchError::PositionFetchFailed)?;

        info!(
            count = positions.len(),
            magic = ?filter.magic,
            "Dispatching close for open positions"
        );
        let items = positions.into_iter().map(CloseItem::Snapshot).collect();
        Ok(self.dispatch(items).await)
    }

    /// Close an explicit list of tickets. Tickets that no longer exist fail
    /// individually; there is no upfront existence check.
    pub async fn close_tickets(&self, tickets: Vec<Ticket>) -> BatchReport {
        info!(count = tickets.len(), "Dispatching batch close");
        let items = tickets.into_iter().map(CloseItem::Lookup).collect();
        self.dispatch(items).await
    }

    async fn dispatch(&self, items: Vec<CloseItem>) -> BatchReport {
        if items.is_empty() {
            return BatchReport::default();
        }
        Metrics::batch_dispatched(items.len());

        let width = self.config.max_concurrency.unwrap_or(items.len()).max(1);
        let closer = self.closer.clone();

        // Detach the batch body from the caller: dropping this future must
        // not abort submissions already in flight.
        let batch = tokio::spawn(run_batch(closer, items, width));
        match batch.await {
            Ok(outcomes) => BatchReport::from_outcomes(outcomes),
            Err(e) => {
                error!(error = %e, "Batch task did not complete");
                BatchReport::default()
            }
        }
    }
}

/// Run all units, collecting outcomes in completion order.
async fn run_batch(
    closer: PositionCloser,
    items: Vec<CloseItem>,
    width: usize,
) -> Vec<CloseOutcome> {
    let semaphore = Arc::new(Semaphore::new(width));
    let mut tasks = JoinSet::new();
    let mut pending: HashMap<tokio::task::Id, Ticket> = HashMap::new();

    for item in items {
        let ticket = item.ticket();
        let closer = closer.clone();
        let semaphore = Arc::clone(&semaphore);
        let handle = tasks.spawn(async move {
            // The semaphore is never closed, so acquisition cannot fail.
            let _permit = semaphore.acquire_owned().await.ok();
            match item {
                CloseItem::Snapshot(position) => closer.close_position(&position).await,
                CloseItem::Lookup(ticket) => closer.close_ticket(ticket).await,
            }
        });
        pending.insert(handle.id(), ticket);
    }

    let mut outcomes = Vec::with_capacity(pending.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                pending.remove(&id);
                outcomes.push(outcome);
            }
            Err(join_error) => {
                // A unit that died still owes the report exactly one outcome.
                let ticket = pending.remove(&join_error.id());
                error!(error = %join_error, ticket = ?ticket, "Close unit did not complete");
                if let Some(ticket) = ticket {
                    outcomes.push(CloseOutcome::Failed {
                        ticket,
                        symbol: None,
                        error: CloseError::Task(join_error.to_string()),
                        result: None,
                    });
                }
            }
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closer::CloseConfig;
    use chrono::Utc;
    use mt5_core::{OrderSide, Position, Price, Quote, Volume};
    use mt5_gateway::MockGateway;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn position(ticket: u64, symbol: &str, side: OrderSide, magic: i64) -> Position {
        Position {
            ticket: Ticket(ticket),
            symbol: symbol.to_string(),
            side,
            volume: Volume::new(dec!(1.0)),
            price_open: Price::new(dec!(1.0950)),
            sl: Price::ZERO,
            tp: Price::ZERO,
            price_current: Price::new(dec!(1.1000)),
            swap: Price::ZERO,
            profit: Price::ZERO,
            magic,
            comment: String::new(),
            time: Utc::now(),
        }
    }

    fn dispatcher(
        gateway: Arc<MockGateway>,
        close: CloseConfig,
        config: DispatchConfig,
    ) -> BatchDispatcher {
        let closer = PositionCloser::new(gateway.clone(), close);
        BatchDispatcher::new(gateway, closer, config)
    }

    fn eurusd_quote(gateway: &MockGateway) {
        gateway.set_quote(
            "EURUSD",
            Quote::new(Price::new(dec!(1.1000)), Price::new(dec!(1.1002))),
        );
    }

    fn closed_set(report: &BatchReport) -> BTreeSet<u64> {
        report.closed.iter().map(|c| c.ticket.inner()).collect()
    }

    fn failed_set(report: &BatchReport) -> BTreeSet<u64> {
        report.failed.iter().map(|f| f.ticket.inner()).collect()
    }

    #[tokio::test]
    async fn test_every_item_yields_exactly_one_outcome() {
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(1, "EURUSD", OrderSide::Buy, 0),
            position(2, "EURUSD", OrderSide::Sell, 0),
            position(3, "EURUSD", OrderSide::Buy, 0),
            position(4, "GBPUSD", OrderSide::Buy, 0),
            position(5, "EURUSD", OrderSide::Buy, 0),
        ]));
        eurusd_quote(&gateway);
        gateway.fail_quote("GBPUSD");

        let dispatcher = dispatcher(gateway, CloseConfig::close_all(), DispatchConfig::default());
        let report = dispatcher.close_all(PositionFilter::all()).await.unwrap();

        assert_eq!(report.len(), 5);
        let mut seen: Vec<u64> = report
            .closed
            .iter()
            .map(|c| c.ticket.inner())
            .chain(report.failed.iter().map(|f| f.ticket.inner()))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        let gateway = Arc::new(MockGateway::new());
        let dispatcher = dispatcher(
            gateway.clone(),
            CloseConfig::close_all(),
            DispatchConfig::default(),
        );

        let report = dispatcher.close_all(PositionFilter::all()).await.unwrap();
        assert!(report.is_empty());

        let report = dispatcher.close_tickets(Vec::new()).await;
        assert!(report.is_empty());
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_quote_failure_affects_only_its_item() {
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(1, "EURUSD", OrderSide::Buy, 0),
            position(2, "GBPUSD", OrderSide::Buy, 0),
            position(3, "EURUSD", OrderSide::Sell, 0),
        ]));
        eurusd_quote(&gateway);
        gateway.fail_quote("GBPUSD");

        let dispatcher = dispatcher(gateway, CloseConfig::close_all(), DispatchConfig::default());
        let report = dispatcher.close_all(PositionFilter::all()).await.unwrap();

        assert_eq!(closed_set(&report), BTreeSet::from([1, 3]));
        assert_eq!(failed_set(&report), BTreeSet::from([2]));
    }

    #[tokio::test]
    async fn test_upfront_fetch_failure_aborts_whole_batch() {
        let gateway = Arc::new(
            MockGateway::new().with_positions(vec![position(1, "EURUSD", OrderSide::Buy, 0)]),
        );
        gateway.set_fail_position_fetch(true);

        let dispatcher = dispatcher(
            gateway.clone(),
            CloseConfig::close_all(),
            DispatchConfig::default(),
        );
        let result = dispatcher.close_all(PositionFilter::all()).await;

        assert!(matches!(result, Err(BatchError::PositionFetchFailed(_))));
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_batch_with_missing_ticket() {
        // Tickets 101 and 103 are open buys on EURUSD; 102 does not exist.
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(101, "EURUSD", OrderSide::Buy, 0),
            position(103, "EURUSD", OrderSide::Buy, 0),
        ]));
        eurusd_quote(&gateway);

        let dispatcher =
            dispatcher(gateway.clone(), CloseConfig::batch(), DispatchConfig::default());
        let report = dispatcher
            .close_tickets(vec![Ticket(101), Ticket(102), Ticket(103)])
            .await;

        assert_eq!(closed_set(&report), BTreeSet::from([101, 103]));
        assert_eq!(failed_set(&report), BTreeSet::from([102]));

        // Buys close as sells at the bid.
        for closed in &report.closed {
            assert_eq!(closed.result.price, Price::new(dec!(1.1000)));
        }
        let failed = &report.failed[0];
        assert_eq!(failed.error.to_string(), "Position not found.");
        assert!(failed.result.is_none());

        // Two submissions: the missing ticket never reached the terminal.
        assert_eq!(gateway.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_already_closed_ticket_is_not_found_again() {
        let gateway = Arc::new(MockGateway::new());
        eurusd_quote(&gateway);
        let dispatcher = dispatcher(gateway, CloseConfig::batch(), DispatchConfig::default());

        let report = dispatcher.close_tickets(vec![Ticket(101)]).await;
        assert_eq!(failed_set(&report), BTreeSet::from([101]));
        assert_eq!(report.failed[0].error.to_string(), "Position not found.");
    }

    #[tokio::test]
    async fn test_magic_filter_restricts_close_all() {
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(1, "EURUSD", OrderSide::Buy, 7),
            position(2, "EURUSD", OrderSide::Buy, 8),
            position(3, "EURUSD", OrderSide::Buy, 7),
        ]));
        eurusd_quote(&gateway);

        let dispatcher = dispatcher(gateway, CloseConfig::close_all(), DispatchConfig::default());
        let report = dispatcher.close_all(PositionFilter::magic(7)).await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(closed_set(&report), BTreeSet::from([1, 3]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_default_width_runs_items_concurrently() {
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(1, "EURUSD", OrderSide::Buy, 0),
            position(2, "EURUSD", OrderSide::Buy, 0),
            position(3, "EURUSD", OrderSide::Buy, 0),
            position(4, "EURUSD", OrderSide::Buy, 0),
        ]));
        eurusd_quote(&gateway);
        gateway.set_submit_delay(Duration::from_millis(50));

        let dispatcher = dispatcher(
            gateway.clone(),
            CloseConfig::close_all(),
            DispatchConfig::default(),
        );
        let report = dispatcher.close_all(PositionFilter::all()).await.unwrap();

        assert_eq!(report.closed.len(), 4);
        assert!(
            gateway.max_in_flight() > 1,
            "expected overlapping submissions, peak was {}",
            gateway.max_in_flight()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sequential_cap_serializes_submissions() {
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(1, "EURUSD", OrderSide::Buy, 0),
            position(2, "EURUSD", OrderSide::Buy, 0),
            position(3, "EURUSD", OrderSide::Buy, 0),
            position(4, "EURUSD", OrderSide::Buy, 0),
        ]));
        eurusd_quote(&gateway);
        gateway.set_submit_delay(Duration::from_millis(10));

        let dispatcher = dispatcher(
            gateway.clone(),
            CloseConfig::close_all(),
            DispatchConfig::capped(1),
        );
        let report = dispatcher.close_all(PositionFilter::all()).await.unwrap();

        assert_eq!(report.closed.len(), 4);
        assert_eq!(gateway.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_mixed_rejection_keeps_partitions_disjoint() {
        let gateway = Arc::new(MockGateway::new().with_positions(vec![
            position(1, "EURUSD", OrderSide::Buy, 0),
            position(2, "EURUSD", OrderSide::Buy, 0),
        ]));
        eurusd_quote(&gateway);
        // First submission is rejected, second succeeds.
        gateway.push_order_result(Ok(mt5_core::OrderResult {
            retcode: mt5_core::retcode::REJECT,
            deal: 0,
            order: 0,
            volume: Volume::ZERO,
            price: Price::ZERO,
            bid: Price::ZERO,
            ask: Price::ZERO,
            comment: "Rejected".to_string(),
            request_id: 1,
        }));

        let dispatcher = dispatcher(
            gateway,
            CloseConfig::close_all(),
            DispatchConfig::capped(1),
        );
        let report = dispatcher.close_all(PositionFilter::all()).await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        let failed = &report.failed[0];
        assert!(failed.result.is_some());
        assert!(failed.error.to_string().contains("Rejected"));
    }
}
