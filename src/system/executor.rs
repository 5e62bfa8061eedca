// src/system/executor.rs

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Command '{0}' did not finish within {1:?}.")]
    TimedOut(String, Duration),
    #[error("Operation was cancelled.")]
    Cancelled,
}

/// A shell snippet to run and capture.
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub script: String,
    /// Working directory. A missing directory falls back to the current one.
    pub cwd: Option<PathBuf>,
    /// Directory prepended to `PATH` so helper scripts resolve.
    pub extra_path: Option<PathBuf>,
    pub timeout: Duration,
}

impl ShellRequest {
    pub fn new(script: impl Into<String>, timeout: Duration) -> Self {
        Self {
            script: script.into(),
            cwd: None,
            extra_path: None,
            timeout,
        }
    }

    pub fn cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn extra_path(mut self, dir: Option<PathBuf>) -> Self {
        self.extra_path = dir;
        self
    }
}

/// Runs shell snippets and captures their standard output.
///
/// Implementations must honor the request timeout and the cancellation token, and must
/// not leave the child process running when either fires.
#[async_trait]
pub trait ShellRunner: Send + Sync + std::fmt::Debug {
    async fn capture(
        &self,
        request: &ShellRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ExecutionError>;
}

/// Runs snippets through `bash -c`.
#[derive(Debug, Clone, Default)]
pub struct BashRunner;

#[async_trait]
impl ShellRunner for BashRunner {
    async fn capture(
        &self,
        request: &ShellRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ExecutionError> {
        let script = request.script.trim();
        if script.is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        let mut command = Command::new("bash");
        command
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = request.cwd.as_deref().filter(|d| d.is_dir()) {
            command.current_dir(dunce::simplified(dir));
        }
        if let Some(dir) = &request.extra_path {
            command.env("PATH", prefixed_path(dir));
        }

        let child = command
            .spawn()
            .map_err(|e| ExecutionError::CommandFailed(script.to_string(), e))?;

        // Dropping the `wait_with_output` future drops the child, which kills it.
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(ExecutionError::Cancelled),
            result = tokio::time::timeout(request.timeout, child.wait_with_output()) => match result {
                Ok(output) => output.map_err(|e| ExecutionError::CommandFailed(script.to_string(), e))?,
                Err(_) => {
                    log::debug!("Command timed out after {:?}: {}", request.timeout, script);
                    return Err(ExecutionError::TimedOut(script.to_string(), request.timeout));
                }
            },
        };

        if !output.status.success() {
            return Err(ExecutionError::NonZeroExitStatus(script.to_string()));
        }

        String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
            command: script.to_string(),
            source: e,
        })
    }
}

fn prefixed_path(dir: &std::path::Path) -> OsString {
    let mut value = OsString::from(dir.as_os_str());
    if let Some(current) = std::env::var_os("PATH") {
        value.push(":");
        value.push(current);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_returns_stdout() {
        let request = ShellRequest::new("echo hello", Duration::from_secs(5));
        let out = BashRunner
            .capture(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_capture_non_zero_exit_is_an_error() {
        let request = ShellRequest::new("exit 3", Duration::from_secs(5));
        let result = BashRunner.capture(&request, &CancellationToken::new()).await;
        assert!(matches!(result, Err(ExecutionError::NonZeroExitStatus(_))));
    }

    #[tokio::test]
    async fn test_capture_times_out() {
        let request = ShellRequest::new("sleep 5", Duration::from_millis(50));
        let result = BashRunner.capture(&request, &CancellationToken::new()).await;
        assert!(matches!(result, Err(ExecutionError::TimedOut(..))));
    }

    #[tokio::test]
    async fn test_capture_respects_prior_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = ShellRequest::new("echo never", Duration::from_secs(5));
        let result = BashRunner.capture(&request, &cancel).await;
        assert!(matches!(result, Err(ExecutionError::Cancelled)));
    }

    #[tokio::test]
    async fn test_capture_runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let request =
            ShellRequest::new("pwd", Duration::from_secs(5)).cwd(Some(dir.path().to_path_buf()));
        let out = BashRunner
            .capture(&request, &CancellationToken::new())
            .await
            .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        let actual = std::path::Path::new(out.trim()).canonicalize().unwrap();
        assert_eq!(actual, expected);
    }
}
