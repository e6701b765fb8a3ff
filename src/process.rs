//! Indexer process execution.
//!
//! Two entry points:
//! - [`ProcessRunner::run`] buffers the whole output (builds)
//! - [`ProcessRunner::stream`] hands stdout out line by line while the
//!   process is still running (queries), so resolution can overlap with
//!   output production
//!
//! A nonzero exit is a [`NavError::ProcessFailure`] carrying the trimmed
//! stderr; a failure to start the binary is a [`NavError::SpawnFailure`].

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Split};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::error::{NavError, Result};

/// Spawns indexer processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new process runner
    pub fn new() -> Self {
        Self
    }

    /// Run a command to completion and return its trimmed stdout
    pub async fn run(&self, command: &str, args: &[String], cwd: &Path) -> Result<String> {
        let mut cmd = prepare(command, args, cwd)?;
        let command_line = command_line(command, args);
        tracing::info!("{} (cwd: {})", command_line, cwd.display());

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_failure(command, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();

        if !stderr.is_empty() {
            tracing::error!("stderr: {:?}\n{}", exit_code, stderr);
        }
        tracing::info!("stdout: {:?}\n{}", exit_code, stdout);

        if !output.status.success() {
            return Err(NavError::ProcessFailure {
                exit_code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(stdout.trim().to_string())
    }

    /// Start a command and expose its stdout as a stream of lines
    pub fn stream(&self, command: &str, args: &[String], cwd: &Path) -> Result<LineStream> {
        let mut cmd = prepare(command, args, cwd)?;
        let command_line = command_line(command, args);
        tracing::info!("{} (cwd: {})", command_line, cwd.display());

        let mut child = cmd
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_failure(command, e))?;

        let stdout = child.stdout.take().ok_or_else(|| NavError::SpawnFailure {
            command: command.to_string(),
            cause: "failed to capture stdout".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| NavError::SpawnFailure {
            command: command.to_string(),
            cause: "failed to capture stderr".to_string(),
        })?;

        let mut stderr_reader = BufReader::new(stderr);
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_reader.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).to_string()
        });

        Ok(LineStream {
            command_line,
            child,
            lines: BufReader::new(stdout).split(b'\n'),
            stderr_task,
        })
    }
}

/// Stdout of a running process, one line at a time
pub struct LineStream {
    command_line: String,
    child: Child,
    lines: Split<BufReader<ChildStdout>>,
    stderr_task: JoinHandle<String>,
}

impl LineStream {
    /// The command line this stream was started with
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Next complete line of stdout, without its line terminator.
    ///
    /// Returns `None` once stdout is closed. Invalid UTF-8 is replaced
    /// rather than rejected since source files need not be UTF-8.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next_segment().await? {
            Some(mut bytes) => {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            None => Ok(None),
        }
    }

    /// Wait for the process to exit and check its status
    pub async fn finish(mut self) -> Result<()> {
        let status = self.child.wait().await?;
        let stderr = self.stderr_task.await.unwrap_or_default();
        let exit_code = status.code();

        if !stderr.is_empty() {
            tracing::error!("stderr: {:?}\n{}", exit_code, stderr);
        }
        tracing::info!("exit: {:?} ({})", exit_code, self.command_line);

        if status.success() {
            Ok(())
        } else {
            Err(NavError::ProcessFailure {
                exit_code,
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

fn prepare(command: &str, args: &[String], cwd: &Path) -> Result<Command> {
    if command.trim().is_empty() {
        return Err(NavError::Config {
            message: "indexer command is empty".to_string(),
        });
    }
    if !cwd.is_dir() {
        return Err(NavError::FileNotFound {
            path: cwd.display().to_string(),
        });
    }

    let mut cmd = Command::new(command);
    cmd.args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    Ok(cmd)
}

fn spawn_failure(command: &str, e: std::io::Error) -> NavError {
    tracing::error!("error: failed to run {}: {}", command, e);
    NavError::SpawnFailure {
        command: command.to_string(),
        cause: e.to_string(),
    }
}

/// Shell-style display form of a command line, for logs
pub fn command_line(command: &str, args: &[String]) -> String {
    std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
