//! Prometheus metrics for the MT5 REST bridge.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Total trade requests submitted to the terminal.
pub static ORDERS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mt5_orders_submitted_total",
        "Total trade requests submitted to the terminal"
    )
    .unwrap()
});

/// Total positions closed successfully.
pub static POSITIONS_CLOSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mt5_positions_closed_total",
        "Total positions closed successfully"
    )
    .unwrap()
});

/// Total failed close attempts, labeled by failure reason.
pub static CLOSE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "mt5_close_failures_total",
        "Total failed close attempts",
        &["reason"]
    )
    .unwrap()
});

/// Batch size distribution of close dispatches.
pub static BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "mt5_close_batch_size",
        "Number of items per close batch",
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0]
    )
    .unwrap()
});

/// Facade for metric updates.
pub struct Metrics;

impl Metrics {
    /// Record a trade request submission.
    pub fn order_submitted() {
        ORDERS_SUBMITTED_TOTAL.inc();
    }

    /// Record a successful close.
    pub fn position_closed() {
        POSITIONS_CLOSED_TOTAL.inc();
    }

    /// Record a failed close attempt.
    pub fn close_failed(reason: &str) {
        CLOSE_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record the size of a dispatched close batch.
    pub fn batch_dispatched(size: usize) {
        BATCH_SIZE.observe(size as f64);
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather() -> TelemetryResult<String> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = POSITIONS_CLOSED_TOTAL.get();
        Metrics::position_closed();
        assert_eq!(POSITIONS_CLOSED_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_gather_renders_text() {
        Metrics::close_failed("quote_unavailable");
        let text = gather().unwrap();
        assert!(text.contains("mt5_close_failures_total"));
    }
}
