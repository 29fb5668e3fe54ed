//! Concurrent batch position closing.
//!
//! The subsystem has three parts:
//! - [`PositionCloser`]: computes and submits the closing order for one
//!   position, converting every failure into a typed [`CloseOutcome`]
//! - [`BatchDispatcher`]: resolves the target set, fans closes out
//!   concurrently under a configurable cap, and collects one outcome per
//!   item
//! - [`BatchReport`]: the aggregated partial-success report
//!
//! Per-item failures never abort sibling items; only the upfront
//! position-list fetch is a batch-level error.

pub mod closer;
pub mod dispatcher;
pub mod error;
pub mod report;

pub use closer::{CloseConfig, CloseOutcome, MagicPolicy, PositionCloser};
pub use dispatcher::{BatchDispatcher, CloseItem, DispatchConfig};
pub use error::{BatchError, CloseError};
pub use report::{BatchReport, ClosedPosition, FailedClose};
