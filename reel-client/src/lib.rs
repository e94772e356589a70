//! Reel Queue Client
//!
//! A small, type-safe client for the remote job queue the Reel worker polls.
//!
//! The client is split in two layers:
//! - [`Transport`]: one raw JSON request/response exchange, with
//!   [`HttpTransport`] as the reqwest implementation
//! - [`QueueClient`]: the typed claim and report exchanges on top of any transport
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reel_client::{HttpTransport, QueueClient};
//! use reel_core::dto::job::Claim;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = HttpTransport::new("https://queue.example.com/exec");
//!     let client = QueueClient::new(Arc::new(transport), "worker-secret");
//!
//!     if let Claim::Job(job) = client.claim_next_job().await? {
//!         println!("Claimed job: {}", job.id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
pub mod transport;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use jobs::{JOB_STATUS_PATH, NEXT_JOB_PATH};
pub use transport::{Exchange, HttpTransport, Transport};

use std::sync::Arc;

/// Typed client for the remote job queue
///
/// Provides the two exchanges a worker needs:
/// - claiming the next job (`next-job`)
/// - reporting a job outcome (`update-job-status`)
#[derive(Clone)]
pub struct QueueClient {
    transport: Arc<dyn Transport>,
    /// Shared secret forwarded as the `secret` query parameter on claims
    secret: String,
}

impl QueueClient {
    /// Create a new queue client over the given transport
    pub fn new(transport: Arc<dyn Transport>, secret: impl Into<String>) -> Self {
        Self {
            transport,
            secret: secret.into(),
        }
    }
}
