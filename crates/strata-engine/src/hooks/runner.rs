use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Why a process produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("failed to start {}: {message}", command.display())]
    Spawn { command: PathBuf, message: String },
}

/// Runs external commands on behalf of the hook registry.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` in `cwd` with extra `env` variables.
    ///
    /// Implementations should stop the process once `timeout` has passed; the
    /// registry enforces the same limit on its side regardless.
    async fn run(
        &self,
        command: &Path,
        cwd: &Path,
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError>;
}
