//! Scheduler layer for the worker
//!
//! This layer polls the queue for new jobs and coordinates their
//! execution. It owns the single-flight guard that keeps at most one job
//! in flight, from claim to report.

pub mod poller;

pub use poller::{JobPoller, TickOutcome};
