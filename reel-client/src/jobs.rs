//! Job-related queue exchanges

use reel_core::dto::job::{Claim, ClaimResponse, ReportRequest, ReportResponse};
use tracing::warn;

use crate::QueueClient;
use crate::error::{ClientError, Result};
use crate::transport::Exchange;

/// Path of the claim endpoint, relative to the queue base URL
pub const NEXT_JOB_PATH: &str = "next-job";

/// Path of the report endpoint, relative to the queue base URL
pub const JOB_STATUS_PATH: &str = "update-job-status";

impl QueueClient {
    // =============================================================================
    // Job Claim
    // =============================================================================

    /// Claim the next pending job
    ///
    /// # Returns
    /// [`Claim::Job`] when a job was handed out, [`Claim::Idle`] when the queue
    /// is empty and [`Claim::Rejected`] when the queue answered `ok: false`.
    pub async fn claim_next_job(&self) -> Result<Claim> {
        let body = self
            .transport
            .exchange(Exchange::post(NEXT_JOB_PATH).query("secret", self.secret.as_str()))
            .await?;

        let response: ClaimResponse = serde_json::from_value(body)
            .map_err(|e| ClientError::ParseError(format!("Invalid next-job response: {}", e)))?;

        Ok(response.into())
    }

    // =============================================================================
    // Job Report
    // =============================================================================

    /// Report a job outcome
    ///
    /// # Returns
    /// The queue's acknowledgement, or `None` when the queue answered with a
    /// body that is not JSON (the report was delivered, its acknowledgement
    /// is unknown).
    pub async fn report_job_status(&self, report: &ReportRequest) -> Result<Option<ReportResponse>> {
        let body = serde_json::to_value(report)
            .map_err(|e| ClientError::InvalidRequest(format!("Unserializable report: {}", e)))?;

        let response = match self
            .transport
            .exchange(Exchange::post(JOB_STATUS_PATH).json(body))
            .await
        {
            Ok(response) => response,
            Err(ClientError::ParseError(e)) => {
                warn!(job_id = %report.id, "Report acknowledgement unreadable: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_value::<ReportResponse>(response) {
            Ok(ack) => Ok(Some(ack)),
            Err(e) => {
                warn!(job_id = %report.id, "Report acknowledgement unreadable: {}", e);
                Ok(None)
            }
        }
    }
}
