//! Job poller
//!
//! Polls the queue on a fixed interval and processes at most one job at a
//! time. Each tick either finds the single-flight guard taken and skips,
//! or takes it and runs one claim → execute → report cycle. Ticks that
//! fire while a cycle is in flight are skipped, never queued.

use futures::FutureExt;
use reel_client::QueueClient;
use reel_core::domain::job::{Job, JobPayload, JobStatus};
use reel_core::domain::pipeline::PipelineResult;
use reel_core::dto::job::Claim;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::service::{JobExecutor, ReportOutcome, StatusReporter};
use crate::session::WorkerSession;

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another cycle held the guard
    Skipped,
    /// The claim exchange failed (network, status code, unparseable body)
    ClaimFailed(String),
    /// The queue answered `ok: false`
    Rejected(String),
    /// No job available
    Idle,
    /// A job was executed and its outcome reported
    Processed {
        job_id: String,
        status: JobStatus,
        report: ReportOutcome,
    },
}

/// Job poller driving the claim/execute/report cycle
pub struct JobPoller {
    config: Config,
    session: Arc<WorkerSession>,
    client: QueueClient,
    executor: Arc<dyn JobExecutor>,
    reporter: StatusReporter,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(
        config: Config,
        session: Arc<WorkerSession>,
        client: QueueClient,
        executor: Arc<dyn JobExecutor>,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            config,
            session,
            client,
            executor,
            reporter,
        }
    }

    /// Starts the polling loop
    ///
    /// The first tick fires immediately. Every tick runs on its own task so
    /// the timer keeps firing (and observing the guard) while a job runs.
    pub async fn run(self: Arc<Self>) {
        info!(
            "Starting job poller (interval: {:?})",
            self.config.poll_interval
        );

        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let poller = Arc::clone(&self);
            tokio::spawn(async move {
                poller.tick().await;
            });
        }
    }

    /// Performs a single poll cycle unless one is already in flight
    pub async fn tick(&self) -> TickOutcome {
        let Some(_guard) = self.session.try_acquire() else {
            info!("Already processing a job, skipping this poll");
            return TickOutcome::Skipped;
        };

        debug!("Polling for next job");

        let claim = match self.client.claim_next_job().await {
            Ok(claim) => claim,
            Err(e) => {
                error!("Claim failed: {}", e);
                return TickOutcome::ClaimFailed(e.to_string());
            }
        };

        match claim {
            Claim::Rejected(reason) => {
                error!("Claim rejected by queue: {}", reason);
                TickOutcome::Rejected(reason)
            }
            Claim::Idle => {
                info!("Idle: no job available");
                TickOutcome::Idle
            }
            Claim::Job(job) => self.process(job).await,
        }
    }

    /// Executes a claimed job and always reports its outcome
    async fn process(&self, job: Job) -> TickOutcome {
        info!(
            job_id = %job.id,
            step = ?job.step,
            kind = ?job.kind,
            "Job received"
        );

        match &job.payload {
            JobPayload::Raw { error, .. } => warn!(
                job_id = %job.id,
                "Payload is not valid JSON, keeping raw text: {}",
                error
            ),
            JobPayload::Empty => debug!(job_id = %job.id, "Job has no payload"),
            JobPayload::Decoded(_) => debug!(job_id = %job.id, "Payload decoded"),
        }

        let result = match AssertUnwindSafe(self.executor.execute(&job))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(job_id = %job.id, "Executor panicked: {}", reason);
                PipelineResult::Aborted(format!("executor panicked: {}", reason))
            }
        };
        let status = result.status();
        let report = self.reporter.report_result(&job.id, &result).await;

        info!(job_id = %job.id, %status, "Job processing finished");

        TickOutcome::Processed {
            job_id: job.id,
            status,
            report,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
