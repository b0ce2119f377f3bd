//! Error types for kindrun.
//!
//! One variant per lifecycle step, plus configuration and I/O failures.
//! Failures of external tools keep the tool's exit code so the process can
//! exit with it after teardown.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::types::LifecycleState;

/// Exit code used when a failing step has no exit code of its own.
pub const GENERIC_FAILURE: i32 = 1;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to provision cluster {name}: {failure}")]
    Provisioning { name: String, failure: ToolFailure },

    #[error("failed to export connection config for {name}: {reason}")]
    ConfigExport {
        name: String,
        reason: String,
        code: Option<i32>,
    },

    #[error("failed to inject registry credentials: {reason}")]
    CredentialInjection { reason: String, code: Option<i32> },

    #[error("deployment failed: {0}")]
    Deployment(ToolFailure),

    #[error("failed to start workload runner `{program}`: {source}")]
    Workload {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to tear down cluster {name}: {failure}")]
    Teardown { name: String, failure: ToolFailure },

    #[error("cannot {operation}: environment is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("interrupted by signal {0}")]
    Interrupted(i32),

    #[error("required tool `{0}` not found on PATH")]
    MissingTool(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An external tool that ran and failed, or could not be started.
#[derive(Error, Debug)]
pub enum ToolFailure {
    #[error("`{program}` exited with {}", describe_code(.code))]
    Exited { program: String, code: Option<i32> },

    #[error("could not run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (killed by signal)".to_string(),
    }
}

impl ToolFailure {
    /// Exit code reported by the tool, if it ran to completion.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Exited { code, .. } => *code,
            Self::Spawn { .. } => None,
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Tool failures propagate the tool's own non-zero code. Signals follow
    /// the shell convention of 128 + signal number.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            Self::Provisioning { failure, .. }
            | Self::Teardown { failure, .. }
            | Self::Deployment(failure) => failure.code(),
            Self::ConfigExport { code, .. } | Self::CredentialInjection { code, .. } => *code,
            Self::Interrupted(signal) => Some(128 + signal),
            Self::Workload { .. }
            | Self::InvalidState { .. }
            | Self::MissingTool(_)
            | Self::Config(_)
            | Self::Io(_) => None,
        };

        match code {
            Some(c) if c != 0 => c,
            _ => GENERIC_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
