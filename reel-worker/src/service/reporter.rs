//! Status reporter
//!
//! Delivers a job outcome to the queue in a single best-effort exchange.
//! Delivery failures are logged and swallowed: there is no local retry
//! queue, the job's terminal state is simply unknown to the worker.

use reel_client::QueueClient;
use reel_core::domain::job::JobStatus;
use reel_core::domain::pipeline::PipelineResult;
use reel_core::dto::job::ReportRequest;
use tracing::{error, info, warn};

/// What happened to a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The queue received the report (acknowledged or unreadable ack)
    Delivered,
    /// The queue answered `ok: false`
    Rejected(String),
    /// The exchange failed; the queue may not know the outcome
    Undelivered(String),
}

/// Reports job outcomes back to the queue
#[derive(Clone)]
pub struct StatusReporter {
    client: QueueClient,
    worker_id: String,
}

impl StatusReporter {
    /// Creates a new reporter attaching `worker_id` to every report
    pub fn new(client: QueueClient, worker_id: impl Into<String>) -> Self {
        Self {
            client,
            worker_id: worker_id.into(),
        }
    }

    /// Reports the outcome of a pipeline run
    pub async fn report_result(&self, job_id: &str, result: &PipelineResult) -> ReportOutcome {
        let artifacts = result.artifacts();
        let detail = result
            .diagnostic()
            .unwrap_or_else(|| "pipeline completed".to_string());
        let mut report = self.request(job_id, result.status(), Some(detail));

        if let Some(primary) = &artifacts.primary {
            report = report.with_result_location(primary.to_string_lossy());
        }
        if let Some(secondary) = &artifacts.secondary {
            report = report.with_thumbnail_location(secondary.to_string_lossy());
        }

        self.send(report).await
    }

    /// Builds a report carrying this worker's identity
    ///
    /// The detail is sent as a note for `DONE` and `HOLD`, and as the error
    /// text for `ERROR`.
    fn request(&self, job_id: &str, status: JobStatus, detail: Option<String>) -> ReportRequest {
        let report = ReportRequest::new(job_id, status, &self.worker_id);
        match (status, detail) {
            (_, None) => report,
            (JobStatus::Error, Some(detail)) => report.with_error(detail),
            (JobStatus::Done | JobStatus::Hold, Some(detail)) => report.with_note(detail),
        }
    }

    async fn send(&self, report: ReportRequest) -> ReportOutcome {
        match report.status {
            JobStatus::Done => info!(
                job_id = %report.id,
                worker_id = %report.worker_id,
                result = ?report.result_location,
                "Job done"
            ),
            JobStatus::Error => error!(
                job_id = %report.id,
                worker_id = %report.worker_id,
                "Job failed: {}",
                report.error.as_deref().unwrap_or("no diagnostic")
            ),
            JobStatus::Hold => warn!(
                job_id = %report.id,
                worker_id = %report.worker_id,
                "Job held: {}",
                report.note.as_deref().unwrap_or("no reason given")
            ),
        }

        match self.client.report_job_status(&report).await {
            Ok(Some(ack)) if ack.ok => {
                info!(job_id = %report.id, status = %report.status, "Report delivered");
                ReportOutcome::Delivered
            }
            Ok(Some(ack)) => {
                let reason = ack.error.unwrap_or_else(|| "ok:false".to_string());
                error!(job_id = %report.id, status = %report.status, "Report rejected: {}", reason);
                ReportOutcome::Rejected(reason)
            }
            Ok(None) => ReportOutcome::Delivered,
            Err(e) => {
                error!(job_id = %report.id, status = %report.status, "Report failed: {}", e);
                ReportOutcome::Undelivered(e.to_string())
            }
        }
    }
}
