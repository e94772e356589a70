//! Worker configuration
//!
//! Defines all configurable parameters for the worker including the queue
//! endpoints, polling interval, media tool location and job output directory.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::service::PipelineSettings;

/// Worker identity used when `WORKER_ID` is not set
pub const DEFAULT_WORKER_ID: &str = "itplaylab-worker-1";

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity attached to every report
    pub worker_id: String,

    /// Queue URL as configured; may point at the next-job endpoint itself
    pub queue_url: String,

    /// Shared secret sent with every claim
    pub worker_secret: String,

    /// Optional bearer token sent with every exchange
    pub auth_token: Option<String>,

    /// How often to poll the queue for new jobs
    pub poll_interval: Duration,

    /// Optional timeout applied to every HTTP exchange
    pub http_timeout: Option<Duration>,

    /// Media tool executable used by every pipeline stage
    pub ffmpeg_path: PathBuf,

    /// Root directory of job-scoped output directories
    pub work_dir: PathBuf,

    /// Duration of the synthetic primary render, in seconds
    pub render_duration_secs: u32,

    /// Whether the thumbnail stage runs after the primary render
    pub thumbnail_enabled: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(worker_id: String, queue_url: String) -> Self {
        Self {
            worker_id,
            queue_url,
            worker_secret: String::new(),
            auth_token: None,
            poll_interval: Duration::from_millis(5000),
            http_timeout: None,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            work_dir: std::env::temp_dir().join("reel-worker"),
            render_duration_secs: 2,
            thumbnail_enabled: true,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JOBQUEUE_WEBAPP_URL (required)
    /// - JOBQUEUE_WORKER_SECRET (optional, default: empty)
    /// - JOBQUEUE_AUTH_TOKEN (optional)
    /// - WORKER_ID (optional, default: itplaylab-worker-1)
    /// - POLL_INTERVAL_MS (optional, milliseconds, default: 5000)
    /// - HTTP_TIMEOUT_SECS (optional, seconds, default: none)
    /// - FFMPEG_PATH (optional, default: ffmpeg from PATH)
    /// - WORK_DIR (optional, default: <tmp>/reel-worker)
    /// - RENDER_DURATION_SECS (optional, default: 2)
    /// - THUMBNAIL_ENABLED (optional, default: true)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let queue_url = lookup("JOBQUEUE_WEBAPP_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("JOBQUEUE_WEBAPP_URL environment variable not set"))?;

        let worker_id = lookup("WORKER_ID")
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_WORKER_ID.to_string());

        let mut config = Self::new(worker_id, queue_url.trim().to_string());

        config.worker_secret = lookup("JOBQUEUE_WORKER_SECRET").unwrap_or_default();
        config.auth_token = lookup("JOBQUEUE_AUTH_TOKEN").filter(|token| !token.is_empty());
        config.poll_interval = Duration::from_millis(parsed(&lookup, "POLL_INTERVAL_MS", 5000)?);
        config.http_timeout = lookup("HTTP_TIMEOUT_SECS")
            .map(|_| parsed(&lookup, "HTTP_TIMEOUT_SECS", 0).map(Duration::from_secs))
            .transpose()?;

        if let Some(path) = lookup("FFMPEG_PATH").filter(|p| !p.is_empty()) {
            config.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("WORK_DIR").filter(|d| !d.is_empty()) {
            config.work_dir = PathBuf::from(dir);
        }

        config.render_duration_secs = parsed(&lookup, "RENDER_DURATION_SECS", 2)?;
        config.thumbnail_enabled = match lookup("THUMBNAIL_ENABLED") {
            Some(value) => parse_flag(&value)
                .ok_or_else(|| anyhow::anyhow!("THUMBNAIL_ENABLED must be a boolean, got '{}'", value))?,
            None => true,
        };

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_id.is_empty() {
            anyhow::bail!("worker_id cannot be empty");
        }

        if !self.queue_url.starts_with("http://") && !self.queue_url.starts_with("https://") {
            anyhow::bail!("queue url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.http_timeout.is_some_and(|t| t.is_zero()) {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        if self.render_duration_secs == 0 {
            anyhow::bail!("render_duration_secs must be greater than 0");
        }

        Ok(())
    }

    /// Base URL of the queue, with any trailing next-job path removed
    pub fn base_url(&self) -> String {
        derive_base_url(&self.queue_url)
    }

    /// Configured queue URL with any query string masked for logging
    pub fn queue_url_redacted(&self) -> String {
        match self.queue_url.split_once('?') {
            Some((path, _)) => format!("{}?***", path),
            None => self.queue_url.clone(),
        }
    }

    /// Claim endpoint, with the secret masked for logging
    pub fn next_job_url_redacted(&self) -> String {
        let secret = if self.worker_secret.is_empty() { "" } else { "***" };
        format!("{}/{}?secret={}", self.base_url(), reel_client::NEXT_JOB_PATH, secret)
    }

    /// Report endpoint
    pub fn job_status_url(&self) -> String {
        format!("{}/{}", self.base_url(), reel_client::JOB_STATUS_PATH)
    }

    /// Settings of the job pipeline
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            ffmpeg_path: self.ffmpeg_path.clone(),
            work_dir: self.work_dir.clone(),
            render_duration_secs: self.render_duration_secs,
            thumbnail_enabled: self.thumbnail_enabled,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_WORKER_ID.to_string(),
            "http://localhost:8080".to_string(),
        )
    }
}

/// Strips everything from the first `/next-job` (case-insensitive) onwards
pub fn derive_base_url(url: &str) -> String {
    let base = match url.to_ascii_lowercase().find("/next-job") {
        Some(idx) => &url[..idx],
        None => url,
    };
    base.trim_end_matches('/').to_string()
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(5000));
        assert_eq!(config.worker_id, DEFAULT_WORKER_ID);
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert!(config.thumbnail_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_queue_url_is_fatal() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("JOBQUEUE_WEBAPP_URL", "  ")])).is_err());
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JOBQUEUE_WEBAPP_URL", "https://queue.example.com/exec/next-job?x=1"),
            ("JOBQUEUE_WORKER_SECRET", "s3cret"),
            ("WORKER_ID", "render-7"),
            ("POLL_INTERVAL_MS", "250"),
            ("HTTP_TIMEOUT_SECS", "15"),
            ("FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
            ("THUMBNAIL_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.worker_id, "render-7");
        assert_eq!(config.worker_secret, "s3cret");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert!(!config.thumbnail_enabled);
        assert_eq!(config.base_url(), "https://queue.example.com/exec");
        assert_eq!(
            config.job_status_url(),
            "https://queue.example.com/exec/update-job-status"
        );
        assert_eq!(
            config.next_job_url_redacted(),
            "https://queue.example.com/exec/next-job?secret=***"
        );
    }

    #[test]
    fn test_queue_url_query_is_redacted() {
        let config = Config::new(
            "worker-1".to_string(),
            "https://queue.example.com/exec/next-job?secret=s3cret".to_string(),
        );
        assert_eq!(
            config.queue_url_redacted(),
            "https://queue.example.com/exec/next-job?***"
        );
        assert!(!config.queue_url_redacted().contains("s3cret"));

        assert_eq!(Config::default().queue_url_redacted(), "http://localhost:8080");
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("JOBQUEUE_WEBAPP_URL", "http://localhost:8080"),
            ("POLL_INTERVAL_MS", "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.queue_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.queue_url = "http://localhost:8080".to_string();
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derive_base_url() {
        assert_eq!(derive_base_url("http://q/exec/NEXT-JOB"), "http://q/exec");
        assert_eq!(derive_base_url("http://q/exec/"), "http://q/exec");
        assert_eq!(derive_base_url("http://q"), "http://q");
    }
}
