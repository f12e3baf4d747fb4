//! External tool invocation.
//!
//! Every kernel-facing action goes through [`ToolRunner`], which returns the
//! exit status and captured output of one process. [`SystemRunner`] spawns
//! real processes with a hard timeout; tests substitute a scripted runner.

use crate::{Error, Result};
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default upper bound for a single tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name, resolved through `PATH`.
    pub program: String,
    /// Arguments, passed verbatim (no shell).
    pub args: Vec<String>,
    /// Lower bound on the runner's timeout, for tools that legitimately run
    /// long.
    pub min_timeout: Option<Duration>,
}

impl Invocation {
    /// Start an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            min_timeout: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Never time this invocation out sooner than `timeout`.
    #[must_use]
    pub fn min_timeout(mut self, timeout: Duration) -> Self {
        self.min_timeout = Some(timeout);
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    #[must_use]
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Human-readable diagnostic: stderr, or stdout if stderr is empty.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }

    /// Turn a non-zero exit into [`Error::ToolFailed`].
    pub fn check(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::ToolFailed {
                program: program.to_string(),
                status: self.status,
                diagnostic: self.diagnostic(),
            })
        }
    }
}

/// Runs external programs.
pub trait ToolRunner: Send + Sync {
    /// Run an invocation to completion.
    ///
    /// A non-zero exit is not an error here; it is reported in
    /// [`ToolOutput::status`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolUnavailable`] when the program cannot be started,
    /// [`Error::Timeout`] when it runs too long.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;

    /// Run an invocation and require a zero exit.
    ///
    /// # Errors
    ///
    /// As [`ToolRunner::run`], plus [`Error::ToolFailed`] on non-zero exit.
    fn run_checked(&self, invocation: &Invocation) -> Result<ToolOutput> {
        self.run(invocation)?.check(&invocation.program)
    }
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        (**self).run(invocation)
    }
}

/// Real process runner with a per-invocation timeout.
///
/// Callers stay synchronous: each call drives the child on a private
/// current-thread runtime, so it must not be called from inside an async
/// task (use `spawn_blocking`).
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SystemRunner {
    /// Create a runner that kills tools running longer than `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Timeout applied to `invocation`.
    #[must_use]
    pub fn timeout_for(&self, invocation: &Invocation) -> Duration {
        invocation
            .min_timeout
            .map_or(self.timeout, |floor| floor.max(self.timeout))
    }

    async fn spawn(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let limit = self.timeout_for(invocation);
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ToolUnavailable {
                    program: invocation.program.clone(),
                    reason: e.to_string(),
                })
            }
            Ok(Err(e)) => Err(Error::IoError(format!(
                "failed to run {}: {e}",
                invocation.program
            ))),
            // Dropping the output future kills the child (kill_on_drop).
            Err(_elapsed) => Err(Error::Timeout {
                program: invocation.program.clone(),
                timeout: limit,
            }),
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "running tool");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::IoError(format!("failed to start process runtime: {e}")))?;

        let result = runtime.block_on(self.spawn(invocation));
        match &result {
            Ok(output) if !output.success() => {
                debug!(command = %invocation, status = ?output.status, "tool exited unsuccessfully");
            }
            Err(e) => warn!(command = %invocation, error = %e, "tool invocation failed"),
            Ok(_) => {}
        }
        result
    }
}
