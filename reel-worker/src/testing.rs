//! In-memory fakes of the worker's I/O seams

use async_trait::async_trait;
use reel_client::{ClientError, Exchange, Transport};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::process::{ProcessError, ProcessOutput, ProcessRunner};

/// Transport answering from a queue of scripted responses
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<reel_client::Result<JsonValue>>>,
    exchanges: Mutex<Vec<Exchange>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: reel_client::Result<JsonValue>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().unwrap().clone()
    }

    /// Exchanges sent to the given path
    pub fn sent_to(&self, path: &str) -> Vec<Exchange> {
        self.exchanges()
            .into_iter()
            .filter(|exchange| exchange.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&self, exchange: Exchange) -> reel_client::Result<JsonValue> {
        self.exchanges.lock().unwrap().push(exchange);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::InvalidRequest("unscripted exchange".into())))
    }
}

/// Process runner answering from a queue of scripted results
#[derive(Default)]
pub struct ScriptedProcessRunner {
    results: Mutex<VecDeque<Result<ProcessOutput, ProcessError>>>,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl ScriptedProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a process that exits with `code` after printing `output`
    pub fn exits(self, code: i32, output: &str) -> Self {
        self.results.lock().unwrap().push_back(Ok(ProcessOutput {
            exit_code: Some(code),
            output: output.to_string(),
        }));
        self
    }

    /// Queues a launch failure
    pub fn fails_to_launch(self) -> Self {
        self.results.lock().unwrap().push_back(Err(ProcessError::Launch {
            program: "ffmpeg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        }));
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedProcessRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));
        self.results.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ProcessOutput {
                exit_code: Some(0),
                output: String::new(),
            })
        })
    }
}
