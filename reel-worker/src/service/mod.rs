//! Service layer
//!
//! Services contain the business logic of the worker: running the media
//! pipeline for a claimed job and reporting its outcome to the queue.
//!
//! Execution is trait-based to enable testing and dependency injection.

mod executor;
mod reporter;

// Re-export traits
pub use executor::JobExecutor;

// Re-export implementations
pub use executor::{FfmpegJobExecutor, PipelineSettings};
pub use reporter::{ReportOutcome, StatusReporter};
