//! Command execution utilities.

use camino::Utf8Path;
use std::ffi::OsStr;
use std::future::Future;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::runtime::{Handle, Runtime};

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
    #[error("Command runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Execute a command and return stdout as a string.
///
/// A non-zero exit is an error carrying the command's stderr.
pub async fn run_command(cmd: &mut Command, name: &str) -> Result<String, CommandError> {
    let output = cmd.output().await.map_err(|e| CommandError::Execution {
        command: name.to_string(),
        error: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::Failed {
            command: name.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Execute a command and report whether it exited successfully.
///
/// Some commands (like `git diff --quiet`) answer with their exit status.
pub async fn run_command_status(cmd: &mut Command, name: &str) -> Result<bool, CommandError> {
    let output = cmd.output().await.map_err(|e| CommandError::Execution {
        command: name.to_string(),
        error: e.to_string(),
    })?;

    Ok(output.status.success())
}

/// Blocking front-end to the async helpers.
///
/// Owns a current-thread runtime. Calls made from inside another tokio
/// runtime fail with [`CommandError::Runtime`].
#[derive(Debug, Clone)]
pub struct Runner {
    runtime: Arc<Runtime>,
}

impl Runner {
    pub fn new() -> Result<Self, CommandError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, CommandError> {
        // Blocking inside a running runtime would panic
        if Handle::try_current().is_ok() {
            return Err(CommandError::Runtime(io::Error::other(
                "blocking command runner called from within an async runtime",
            )));
        }
        Ok(self.runtime.block_on(fut))
    }

    fn command<I, S>(program: &str, args: I, cwd: &Utf8Path) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(cwd);
        cmd
    }

    /// Run `program` in `cwd` and return its stdout.
    pub fn run<I, S>(&self, program: &str, args: I, cwd: &Utf8Path) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Self::command(program, args, cwd);
        tracing::debug!(program, %cwd, "running command");
        self.block_on(run_command(&mut cmd, program))?
    }

    /// Run `program` in `cwd` and return whether it exited successfully.
    pub fn succeeds<I, S>(&self, program: &str, args: I, cwd: &Utf8Path) -> Result<bool, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Self::command(program, args, cwd);
        self.block_on(run_command_status(&mut cmd, program))?
    }
}
