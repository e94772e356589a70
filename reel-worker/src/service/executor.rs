//! Job executor
//!
//! Runs the fixed media pipeline for one job:
//! - `probe`: `ffmpeg -version`, verifies the tool works at all
//! - `render`: synthetic test-source render into the job's output directory
//! - `thumbnail` (optional): still frame extracted from the render
//!
//! Stages run strictly in order and the first failure ends the pipeline.
//! Failures are returned as values so the caller always gets to report.

use async_trait::async_trait;
use reel_core::domain::job::Job;
use reel_core::domain::pipeline::{Artifacts, PipelineResult, Stage, StageFailure};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::process::ProcessRunner;

/// Longest tail of process output kept in a failure diagnostic
const MAX_DIAGNOSTIC_LEN: usize = 2000;

const RENDER_SIZE: &str = "640x360";
const RENDER_RATE: u32 = 30;
const PRIMARY_FILE: &str = "output.mp4";
const THUMBNAIL_FILE: &str = "thumbnail.jpg";
/// Seek position of the thumbnail frame, in seconds
const THUMBNAIL_OFFSET: &str = "1";

/// Service trait for executing a claimed job
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Executes the pipeline for a job
    ///
    /// Never fails: stage failures are part of the returned result.
    async fn execute(&self, job: &Job) -> PipelineResult;
}

/// Settings of the media pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub ffmpeg_path: PathBuf,
    pub work_dir: PathBuf,
    pub render_duration_secs: u32,
    pub thumbnail_enabled: bool,
}

/// [`JobExecutor`] driving ffmpeg through a [`ProcessRunner`]
pub struct FfmpegJobExecutor {
    runner: Arc<dyn ProcessRunner>,
    settings: PipelineSettings,
}

impl FfmpegJobExecutor {
    /// Creates a new executor
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: PipelineSettings) -> Self {
        Self { runner, settings }
    }

    /// Output directory of a job
    ///
    /// Job ids are opaque, so anything outside `[A-Za-z0-9_-]` is replaced
    /// to keep the directory inside the work dir.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        let name: String = job_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.settings.work_dir.join(name)
    }

    fn probe_args(&self) -> Vec<String> {
        vec!["-version".to_string()]
    }

    fn render_args(&self, output: &Path) -> Vec<String> {
        let source = format!(
            "testsrc=duration={}:size={}:rate={}",
            self.settings.render_duration_secs, RENDER_SIZE, RENDER_RATE
        );
        [
            "-y", "-v", "error", "-f", "lavfi", "-i", source.as_str(), "-c:v", "libx264", "-pix_fmt",
            "yuv420p",
        ]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once(output.to_string_lossy().to_string()))
        .collect()
    }

    fn thumbnail_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            THUMBNAIL_OFFSET.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Runs one stage; any launch error or non-zero exit is a failure
    async fn run_stage(
        &self,
        job_id: &str,
        stage: Stage,
        args: Vec<String>,
        artifacts: &Artifacts,
    ) -> Result<(), StageFailure> {
        info!(job_id, %stage, "Running stage");

        let failure = |exit_code: Option<i32>, diagnostic: String| StageFailure {
            stage,
            exit_code,
            diagnostic,
            artifacts: artifacts.clone(),
        };

        match self.runner.run(&self.settings.ffmpeg_path, &args).await {
            Ok(output) if output.success() => {
                debug!(job_id, %stage, "Stage completed");
                Ok(())
            }
            Ok(output) => {
                let code = output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none (terminated by signal)".to_string());
                Err(failure(
                    output.exit_code,
                    format!("exit code {}: {}", code, tail(&output.output)),
                ))
            }
            Err(e) => Err(failure(None, e.to_string())),
        }
    }

    async fn run_pipeline(&self, job: &Job, artifacts: &mut Artifacts) -> Result<(), StageFailure> {
        self.run_stage(&job.id, Stage::Probe, self.probe_args(), artifacts)
            .await?;

        let job_dir = self.job_dir(&job.id);
        tokio::fs::create_dir_all(&job_dir)
            .await
            .map_err(|e| StageFailure {
                stage: Stage::Render,
                exit_code: None,
                diagnostic: format!(
                    "failed to create output directory {}: {}",
                    job_dir.display(),
                    e
                ),
                artifacts: artifacts.clone(),
            })?;

        let primary = job_dir.join(PRIMARY_FILE);
        self.run_stage(&job.id, Stage::Render, self.render_args(&primary), artifacts)
            .await?;
        artifacts.primary = Some(primary.clone());

        if self.settings.thumbnail_enabled {
            let thumbnail = job_dir.join(THUMBNAIL_FILE);
            self.run_stage(
                &job.id,
                Stage::Thumbnail,
                self.thumbnail_args(&primary, &thumbnail),
                artifacts,
            )
            .await?;
            artifacts.secondary = Some(thumbnail);
        }

        Ok(())
    }
}

#[async_trait]
impl JobExecutor for FfmpegJobExecutor {
    async fn execute(&self, job: &Job) -> PipelineResult {
        info!(job_id = %job.id, "Starting pipeline");

        let mut artifacts = Artifacts::default();
        match self.run_pipeline(job, &mut artifacts).await {
            Ok(()) => {
                info!(job_id = %job.id, "Pipeline completed successfully");
                PipelineResult::Succeeded(artifacts)
            }
            Err(failure) => {
                error!(
                    job_id = %job.id,
                    stage = %failure.stage,
                    exit_code = ?failure.exit_code,
                    "Stage failed: {}",
                    failure.diagnostic
                );
                PipelineResult::Failed(failure)
            }
        }
    }
}

/// Last `MAX_DIAGNOSTIC_LEN` bytes of `output`, cut on a char boundary
fn tail(output: &str) -> String {
    let output = output.trim();
    if output.len() <= MAX_DIAGNOSTIC_LEN {
        return output.to_string();
    }

    let mut start = output.len() - MAX_DIAGNOSTIC_LEN;
    while !output.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &output[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProcessRunner;
    use reel_core::domain::job::JobPayload;

    fn job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            step: None,
            kind: None,
            payload: JobPayload::Empty,
        }
    }

    fn settings(work_dir: &Path, thumbnail_enabled: bool) -> PipelineSettings {
        PipelineSettings {
            ffmpeg_path: PathBuf::from("/usr/bin/ffmpeg"),
            work_dir: work_dir.to_path_buf(),
            render_duration_secs: 2,
            thumbnail_enabled,
        }
    }

    fn work_dir(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join("reel-worker-tests")
            .join(format!("{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let dir = work_dir("all-succeed");
        let runner = Arc::new(ScriptedProcessRunner::new().exits(0, "ffmpeg version 7.0"));
        let executor = FfmpegJobExecutor::new(runner.clone(), settings(&dir, true));

        let result = executor.execute(&job("42")).await;

        let expected_dir = dir.join("42");
        assert_eq!(
            result,
            PipelineResult::Succeeded(Artifacts {
                primary: Some(expected_dir.join(PRIMARY_FILE)),
                secondary: Some(expected_dir.join(THUMBNAIL_FILE)),
            })
        );

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(program, _)| program == Path::new("/usr/bin/ffmpeg")));
        assert_eq!(calls[0].1, vec!["-version".to_string()]);
        assert!(calls[1].1.contains(&"testsrc=duration=2:size=640x360:rate=30".to_string()));
        assert_eq!(
            calls[1].1.last().map(PathBuf::from),
            Some(expected_dir.join(PRIMARY_FILE))
        );
        assert!(calls[2].1.contains(&expected_dir.join(PRIMARY_FILE).to_string_lossy().to_string()));
        assert!(expected_dir.is_dir());
    }

    #[tokio::test]
    async fn test_probe_failure_stops_pipeline() {
        let dir = work_dir("probe-fails");
        let runner = Arc::new(ScriptedProcessRunner::new().fails_to_launch());
        let executor = FfmpegJobExecutor::new(runner.clone(), settings(&dir, true));

        let result = executor.execute(&job("7")).await;

        match result {
            PipelineResult::Failed(failure) => {
                assert_eq!(failure.stage, Stage::Probe);
                assert_eq!(failure.exit_code, None);
                assert!(failure.diagnostic.contains("failed to launch"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_skips_thumbnail() {
        let dir = work_dir("render-fails");
        let runner = Arc::new(
            ScriptedProcessRunner::new()
                .exits(0, "ffmpeg version 7.0")
                .exits(187, "Unknown encoder 'libx264'"),
        );
        let executor = FfmpegJobExecutor::new(runner.clone(), settings(&dir, true));

        let result = executor.execute(&job("8")).await;

        match result {
            PipelineResult::Failed(failure) => {
                assert_eq!(failure.stage, Stage::Render);
                assert_eq!(failure.exit_code, Some(187));
                assert!(failure.diagnostic.contains("Unknown encoder"));
                assert!(failure.artifacts.primary.is_none());
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_thumbnail_failure_keeps_primary() {
        let dir = work_dir("thumbnail-fails");
        let runner = Arc::new(
            ScriptedProcessRunner::new()
                .exits(0, "")
                .exits(0, "")
                .exits(1, "Output file is empty"),
        );
        let executor = FfmpegJobExecutor::new(runner.clone(), settings(&dir, true));

        let result = executor.execute(&job("42")).await;

        match result {
            PipelineResult::Failed(failure) => {
                assert_eq!(failure.stage, Stage::Thumbnail);
                assert_eq!(failure.exit_code, Some(1));
                assert_eq!(failure.diagnostic, "exit code 1: Output file is empty");
                assert_eq!(
                    failure.artifacts.primary,
                    Some(dir.join("42").join(PRIMARY_FILE))
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_thumbnail_stage_is_optional() {
        let dir = work_dir("no-thumbnail");
        let runner = Arc::new(ScriptedProcessRunner::new());
        let executor = FfmpegJobExecutor::new(runner.clone(), settings(&dir, false));

        let result = executor.execute(&job("9")).await;

        assert!(result.is_success());
        assert!(result.artifacts().secondary.is_none());
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_job_dir_is_sanitized() {
        let executor = FfmpegJobExecutor::new(
            Arc::new(ScriptedProcessRunner::new()),
            settings(Path::new("/work"), true),
        );
        assert_eq!(executor.job_dir("../../etc"), PathBuf::from("/work/______etc"));
        assert_eq!(executor.job_dir("job-1_a"), PathBuf::from("/work/job-1_a"));
    }

    #[test]
    fn test_tail_truncates_long_output() {
        let long = "é".repeat(MAX_DIAGNOSTIC_LEN);
        let cut = tail(&long);
        assert!(cut.starts_with("..."));
        assert!(cut.len() <= MAX_DIAGNOSTIC_LEN + 3);
        assert_eq!(tail("  short  "), "short");
    }
}
