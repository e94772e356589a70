//! External process execution
//!
//! Launches the media tool for each pipeline stage. Stdout and stderr are
//! drained concurrently into one owned buffer while the process runs; the
//! combined text is handed to the caller only after exit.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Errors that prevent a process from running to completion
///
/// A non-zero exit is not an error here, it is reported through
/// [`ProcessOutput::exit_code`].
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be started (not found, permission denied...)
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process started but its exit status could not be collected
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a process that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Stdout and stderr, concatenated in arrival order
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches external executables
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `args` and waits for it to exit
    async fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ProcessError>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ProcessError> {
        let program_name = program.display().to_string();
        debug!("Running process: {} {}", program_name, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Launch {
                program: program_name.clone(),
                source,
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_chunks(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_chunks(stderr, tx.clone()));
        }
        drop(tx);

        // The channel closes once both streams reach EOF
        let mut buffer = Vec::new();
        while let Some(chunk) = rx.recv().await {
            buffer.extend_from_slice(&chunk);
        }

        let status = child.wait().await.map_err(|source| ProcessError::Wait {
            program: program_name.clone(),
            source,
        })?;

        debug!("Process {} exited with {}", program_name, status);

        Ok(ProcessOutput {
            exit_code: status.code(),
            output: String::from_utf8_lossy(&buffer).into_owned(),
        })
    }
}

/// Reads `reader` to EOF, sending each chunk as it arrives
async fn forward_chunks<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(chunk[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("Stopped reading process output: {}", e);
                break;
            }
        }
    }
}
