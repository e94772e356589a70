//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::domain::job::JobStatus;

/// A stage of the fixed job pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Tool version query, verifies the executable works at all
    Probe,
    /// Primary artifact render
    Render,
    /// Still frame derived from the primary artifact
    Thumbnail,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Render => "render",
            Self::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifacts produced by a successful pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub primary: Option<PathBuf>,
    pub secondary: Option<PathBuf>,
}

/// Details of the stage that stopped the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    /// Exit code of the stage process; `None` on launch failure or death by signal
    pub exit_code: Option<i32>,
    /// Human-readable diagnostic including captured process output
    pub diagnostic: String,
    /// Artifacts already written by earlier stages, left on disk
    pub artifacts: Artifacts,
}

static NO_ARTIFACTS: Artifacts = Artifacts {
    primary: None,
    secondary: None,
};

/// Outcome of running the pipeline for one job
///
/// Produced exactly once per job execution and consumed by the status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Succeeded(Artifacts),
    Failed(StageFailure),
    /// The executor itself broke down outside any stage
    Aborted(String),
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Status to report for this outcome
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Succeeded(_) => JobStatus::Done,
            Self::Failed(_) | Self::Aborted(_) => JobStatus::Error,
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        match self {
            Self::Succeeded(artifacts) => artifacts,
            Self::Failed(failure) => &failure.artifacts,
            Self::Aborted(_) => &NO_ARTIFACTS,
        }
    }

    /// Diagnostic text of a failed run, prefixed with the failing stage
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(failure) => Some(format!(
                "stage '{}' failed: {}",
                failure.stage, failure.diagnostic
            )),
            Self::Aborted(reason) => Some(format!("pipeline aborted: {}", reason)),
        }
    }
}
