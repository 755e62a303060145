//! Process execution boundary.
//!
//! [`CommandRunner`] is the only way the rest of the crate talks to the
//! operating system. Production code uses [`ShellRunner`]; tests inject
//! scripted runners that serve canned output.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use std::future::Future;
use std::io;
use std::process::Output;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Command execution failed [status: {status:?}]: {stderr}")]
    CommandFailed { status: Option<i32>, stderr: String },
    #[error("Command cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}

/// Runs a named program and hands back its stdout split into lines.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cancel: &CancellationToken, program: &str, args: &[String]) -> Result<Vec<String>, Error>;
}

/// Production [`CommandRunner`] spawning real processes.
#[derive(Clone, Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, cancel: &CancellationToken, program: &str, args: &[String]) -> Result<Vec<String>, Error> {
        let stdout = Command::new(program).args(args).run_stdout(cancel).await?;
        Ok(stdout.lines().map(str::to_string).collect())
    }
}

pub trait ShellCommandExt {
    fn run_stdout(&mut self, cancel: &CancellationToken) -> impl Future<Output = Result<String, Error>> + Send;
}

impl ShellCommandExt for Command {
    /// Run the command to completion unless `cancel` fires first.
    /// The child is killed when the pending output future is dropped.
    async fn run_stdout(&mut self, cancel: &CancellationToken) -> Result<String, Error> {
        let cmd_debug = format!("{:?}", self);
        self.kill_on_drop(true);
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(cmd = cmd_debug, "command cancelled");
                return Err(Error::Cancelled);
            }
            res = self.output() => res?,
        };
        stdout_from_output(cmd_debug, output)
    }
}

pub fn stdout_from_output(cmd: String, output: Output) -> Result<String, Error> {
    let stderrempty = output.stderr.is_empty();
    let stdout = String::from_utf8_lossy(&output.stdout);
    match (stderrempty, output.status) {
        (true, status) if status.success() => Ok(stdout.trim().to_string()),
        (false, status) if status.success() => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(cmd, %stderr, "Non empty stderr on successful command");
            Ok(stdout.trim().to_string())
        }
        (_, status) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(cmd, status_code = ?status.code(), %stdout, %stderr, "Error executing command");
            Err(Error::CommandFailed {
                status: status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}
