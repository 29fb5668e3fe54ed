//! Aggregated batch report.

use mt5_core::{OrderResult, Ticket};

use crate::closer::CloseOutcome;
use crate::error::CloseError;

/// One successfully closed position.
#[derive(Debug, Clone)]
pub struct ClosedPosition {
    pub ticket: Ticket,
    /// Raw terminal result for the closing deal.
    pub result: OrderResult,
}

/// One failed close attempt.
#[derive(Debug, Clone)]
pub struct FailedClose {
    pub ticket: Ticket,
    /// Symbol, when the attempt got far enough to resolve one.
    pub symbol: Option<String>,
    pub error: CloseError,
    /// Raw terminal result, when the terminal produced one.
    pub result: Option<OrderResult>,
}

/// Partitioned outcomes of one batch.
///
/// Neither list carries an ordering guarantee: outcomes are collected as
/// the concurrent units complete. Consumers must treat both as sets.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub closed: Vec<ClosedPosition>,
    pub failed: Vec<FailedClose>,
}

impl BatchReport {
    /// Partition collected outcomes into the report.
    pub fn from_outcomes(outcomes: Vec<CloseOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome {
                CloseOutcome::Closed { ticket, result } => {
                    report.closed.push(ClosedPosition { ticket, result });
                }
                CloseOutcome::Failed {
                    ticket,
                    symbol,
                    error,
                    result,
                } => {
                    report.failed.push(FailedClose {
                        ticket,
                        symbol,
                        error,
                        result,
                    });
                }
            }
        }
        report
    }

    /// Total number of outcomes in the report.
    pub fn len(&self) -> usize {
        self.closed.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.failed.is_empty()
    }

    /// Tickets that closed, in completion order.
    pub fn closed_tickets(&self) -> Vec<Ticket> {
        self.closed.iter().map(|c| c.ticket).collect()
    }
}
