//! Process-executor collaborator.
//!
//! Everything that invokes external binaries (docker, buildah, podman,
//! apptainer, git, generated wrappers) goes through [`ProcessExecutor`] so
//! callers can substitute a recording implementation in tests. Artifact
//! generation itself never executes anything.

use crate::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Outcome of an external process invocation.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Exit code; 127 when the process was killed by a signal
    pub status: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Invokes external binaries and reports their outcome.
pub trait ProcessExecutor {
    /// Run `program` with `args`, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<ExecOutput>;

    /// Run `program` with `args`, inheriting the parent's stdio.
    ///
    /// Used for interactive invocations where output should stream through.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_inherited(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<i32>;
}

/// Default executor shelling out via `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl ProcessExecutor for SystemExecutor {
    fn run(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<ExecOutput> {
        debug!(program, ?args, "running external command");
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        let output = command
            .output()
            .map_err(|source| Error::io(source, format!("spawning '{program}'"), None))?;
        Ok(ExecOutput {
            status: output.status.code().unwrap_or(127),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_inherited(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<i32> {
        debug!(program, ?args, "running external command (inherited stdio)");
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        let status = command
            .status()
            .map_err(|source| Error::io(source, format!("spawning '{program}'"), None))?;
        Ok(status.code().unwrap_or(127))
    }
}
