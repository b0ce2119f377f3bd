//! External process execution.
//!
//! Every collaborator (kind, docker, helm, the registry helper, the workload
//! runner) is reached through the `Executor` trait so the lifecycle can be
//! driven by a scripted executor in tests.
//!
//! Child stderr is always inherited: tool diagnostics reach the terminal
//! unmodified. Stdout is either inherited or captured, per invocation.

use std::fmt;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::interrupt::Interrupt;

/// How often a running child is checked for exit or interruption.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Capture stdout instead of passing it through.
    pub capture_stdout: bool,
    /// Abort the command when a termination signal arrives.
    pub interruptible: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            capture_stdout: false,
            interruptible: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Run to completion even if a termination signal arrives.
    pub fn uninterruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// Exit code, `None` if the child was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout; empty when stdout was inherited.
    pub stdout: String,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Failure to run a command at all.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed while waiting: {0}")]
    Io(#[source] io::Error),

    #[error("interrupted by signal {0}")]
    Interrupted(i32),
}

/// Runs external commands.
pub trait Executor {
    /// Run `invocation` and wait for it.
    ///
    /// A non-zero exit is a `Completion`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the command cannot be started or waited on, or
    /// was aborted by a termination signal.
    fn execute(&self, invocation: &Invocation) -> Result<Completion, ExecError>;

    /// Whether `program` can be started.
    fn locate(&self, program: &str) -> bool;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, invocation: &Invocation) -> Result<Completion, ExecError> {
        (**self).execute(invocation)
    }

    fn locate(&self, program: &str) -> bool {
        (**self).locate(program)
    }
}

/// Executor backed by real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    interrupt: Interrupt,
}

impl SystemExecutor {
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }

    fn pending_signal(&self, invocation: &Invocation) -> Option<i32> {
        if invocation.interruptible {
            self.interrupt.signal()
        } else {
            None
        }
    }
}

impl Executor for SystemExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<Completion, ExecError> {
        if let Some(signal) = self.pending_signal(invocation) {
            return Err(ExecError::Interrupted(signal));
        }

        debug!(command = %invocation, "running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .stdout(if invocation.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::inherit()
            });

        let mut child = cmd.spawn().map_err(ExecError::Spawn)?;

        // Drain stdout on a helper thread so a chatty child never blocks on a
        // full pipe while we poll.
        let reader = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                out.read_to_end(&mut buf).map(|_| buf)
            })
        });

        let status = loop {
            if let Some(status) = child.try_wait().map_err(ExecError::Io)? {
                break status;
            }
            if let Some(signal) = self.pending_signal(invocation) {
                debug!(command = %invocation, signal, "killing child after signal");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Interrupted(signal));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = match reader {
            Some(handle) => {
                let bytes = handle
                    .join()
                    .map_err(|_| {
                        ExecError::Io(io::Error::new(
                            io::ErrorKind::Other,
                            "stdout reader panicked",
                        ))
                    })?
                    .map_err(ExecError::Io)?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            None => String::new(),
        };

        trace!(command = %invocation, code = ?status.code(), "finished");
        Ok(Completion {
            code: status.code(),
            stdout,
        })
    }

    fn locate(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
