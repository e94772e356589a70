//! Reel Worker
//!
//! A long-running worker that claims media jobs from a remote queue, runs
//! them through an ffmpeg pipeline and reports the outcome back.
//!
//! Architecture:
//! - Configuration: Load settings from environment variables
//! - Session: Worker identity and the single-flight guard
//! - Process: Async subprocess execution with captured output
//! - Services: Pipeline execution and status reporting
//! - Scheduler: Fixed-interval polling, one job in flight at a time
//!
//! The worker polls the queue, executes at most one job at a time, and
//! always attempts to report the outcome of every job it claimed.

mod config;
mod process;
mod scheduler;
mod service;
mod session;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use reel_client::{HttpTransport, QueueClient};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::process::TokioProcessRunner;
use crate::scheduler::JobPoller;
use crate::service::{FfmpegJobExecutor, JobExecutor, StatusReporter};
use crate::session::WorkerSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reel_worker=info,reel_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Reel Worker");

    // Missing or invalid configuration is the only fatal startup error
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Worker id:      {}", config.worker_id);
    info!("Queue URL:      {}", config.queue_url_redacted());
    info!("Base URL:       {}", config.base_url());
    info!("Next job URL:   {}", config.next_job_url_redacted());
    info!("Job status URL: {}", config.job_status_url());
    info!("Poll interval:  {:?}", config.poll_interval);
    info!("ffmpeg:         {}", config.ffmpeg_path.display());
    info!("Work dir:       {}", config.work_dir.display());

    if config.worker_secret.is_empty() {
        warn!("JOBQUEUE_WORKER_SECRET is empty; set it if the queue requires authentication");
    }

    let client = build_client(&config)?;
    info!("Queue client initialized");

    let session = Arc::new(WorkerSession::new(config.worker_id.clone()));
    let executor: Arc<dyn JobExecutor> = Arc::new(FfmpegJobExecutor::new(
        Arc::new(TokioProcessRunner::new()),
        config.pipeline_settings(),
    ));
    let reporter = StatusReporter::new(client.clone(), session.worker_id());

    let poller = Arc::new(JobPoller::new(
        config.clone(),
        session,
        client,
        executor,
        reporter,
    ));

    info!("Worker initialized successfully");
    poller.run().await;

    Ok(())
}

/// Builds the queue client, forwarding the configured authentication material
fn build_client(config: &Config) -> Result<QueueClient> {
    let mut http = reqwest::Client::builder();
    if let Some(timeout) = config.http_timeout {
        http = http.timeout(timeout);
    }
    let http = http.build().context("Failed to build HTTP client")?;

    let mut transport = HttpTransport::with_client(config.base_url(), http);
    if let Some(token) = &config.auth_token {
        transport = transport
            .with_bearer_token(token)
            .context("Invalid JOBQUEUE_AUTH_TOKEN")?;
    }

    Ok(QueueClient::new(
        Arc::new(transport),
        config.worker_secret.clone(),
    ))
}
