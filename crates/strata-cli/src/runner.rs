//! Hook process runner backed by `tokio::process`.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use strata_engine::hooks::{ProcessOutput, ProcessRunner, RunnerError};
use tokio::process::Command;
use tracing::debug;

/// Spawns hook scripts as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &Path,
        cwd: &Path,
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        debug!(command = %command.display(), cwd = %cwd.display(), "spawning hook");

        let child = Command::new(command)
            .current_dir(cwd)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::Spawn {
                command: command.to_path_buf(),
                message: e.to_string(),
            })?;

        // Dropping the wait future on timeout kills the child.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| RunnerError::TimedOut(timeout))?
            .map_err(|e| RunnerError::Spawn {
                command: command.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_command_is_spawn_error() {
        let err = TokioProcessRunner
            .run(
                Path::new("/definitely/not/a/hook"),
                Path::new("/"),
                &HashMap::new(),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_captures_exit_code() {
        let env = HashMap::from([("STRATA_HOOK".to_string(), "pre-commit".to_string())]);
        let output = TokioProcessRunner
            .run(
                Path::new("/bin/sh"),
                Path::new("/"),
                &env,
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        // `sh` with closed stdin exits cleanly.
        assert_eq!(output.exit_code, Some(0));
    }
}
