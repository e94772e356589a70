//! Job DTOs for the claim and report exchanges

use serde::{Deserialize, Serialize};

use crate::domain::job::{Job, JobStatus};

fn default_ok() -> bool {
    true
}

/// Response body of the claim (next-job) exchange
///
/// Only an explicit `ok: false` marks the response as a failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    #[serde(default = "default_ok")]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub has_job: Option<bool>,
    #[serde(default)]
    pub job: Option<Job>,
}

/// Interpretation of a claim response
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// The queue explicitly signalled failure
    Rejected(String),
    /// Nothing to do this cycle
    Idle,
    Job(Job),
}

impl From<ClaimResponse> for Claim {
    fn from(response: ClaimResponse) -> Self {
        if !response.ok {
            return Self::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "malformed response or ok:false".to_string()),
            );
        }

        match (response.has_job, response.job) {
            (Some(false), _) | (_, None) => Self::Idle,
            (_, Some(job)) => Self::Job(job),
        }
    }
}

/// Request body of the report (update-job-status) exchange
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub id: String,
    /// Same value as `id`, for queues keyed by trace id
    pub trace_id: String,
    pub status: JobStatus,
    pub ok: bool,
    pub step: String,
    pub worker_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_location: Option<String>,
    pub reported_at: chrono::DateTime<chrono::Utc>,
}

impl ReportRequest {
    pub fn new(job_id: impl Into<String>, status: JobStatus, worker_id: impl Into<String>) -> Self {
        let id = job_id.into();
        Self {
            trace_id: id.clone(),
            id,
            status,
            ok: status == JobStatus::Done,
            step: status.step().to_string(),
            worker_id: worker_id.into(),
            note: None,
            error: None,
            result_location: None,
            thumbnail_location: None,
            reported_at: chrono::Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_result_location(mut self, location: impl Into<String>) -> Self {
        self.result_location = Some(location.into());
        self
    }

    pub fn with_thumbnail_location(mut self, location: impl Into<String>) -> Self {
        self.thumbnail_location = Some(location.into());
        self
    }
}

/// Response body of the report exchange
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    #[serde(default = "default_ok")]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
