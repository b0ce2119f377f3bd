//! Command-line interface.

pub mod completions;
pub mod name;
pub mod output;
pub mod run;
pub mod teardown;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::config::RunSettings;
use crate::core::constants;

/// kindrun - ephemeral kind clusters for CI test runs.
#[derive(Parser)]
#[command(
    name = "kindrun",
    about = "Ephemeral kind clusters for CI test runs, torn down on every exit path",
    version
)]
pub struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Path to a kindrun.toml configuration file
    #[arg(long, env = constants::CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log formatter selection.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create a cluster, deploy, run the workload and tear the cluster down
    Run {
        /// Workload selector passed to the runner (e.g. a tox environment)
        selector: String,

        #[command(flatten)]
        ci: CiArgs,

        /// Override where the kubeconfig is written
        #[arg(long)]
        kubeconfig: Option<PathBuf>,
    },

    /// Print the cluster name derived from a job identifier
    Name {
        /// CI job identifier
        #[arg(long, env = "BUILDKITE_JOB_ID")]
        job_id: String,
    },

    /// Delete a cluster left behind by an earlier run
    Teardown {
        /// CI job identifier the cluster was created for
        #[arg(long, env = "BUILDKITE_JOB_ID")]
        job_id: String,

        /// Override the kubeconfig path to clean up
        #[arg(long)]
        kubeconfig: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Values the CI system provides through environment variables.
#[derive(Args, Debug, Clone)]
pub struct CiArgs {
    /// Registry account identifier
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    pub account_id: String,

    /// Build identifier, used in image tags
    #[arg(long, env = "BUILDKITE_BUILD_ID")]
    pub build_id: String,

    /// Job identifier, used to name the cluster
    #[arg(long, env = "BUILDKITE_JOB_ID")]
    pub job_id: String,

    /// Runtime selector, used in image tags
    #[arg(long, env = "TOX_PY_VERSION")]
    pub runtime: String,
}

impl From<CiArgs> for RunSettings {
    fn from(args: CiArgs) -> Self {
        Self {
            account_id: args.account_id,
            build_id: args.build_id,
            job_id: args.job_id,
            runtime: args.runtime,
        }
    }
}

/// Supported shells for completions.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command, returning the process exit code.
pub fn execute(command: Command, config: Option<PathBuf>) -> crate::error::Result<i32> {
    use Command::*;

    match command {
        Run {
            selector,
            ci,
            kubeconfig,
        } => run::execute(&selector, ci.into(), kubeconfig, config.as_deref()),
        Name { job_id } => name::execute(&job_id, config.as_deref()),
        Teardown { job_id, kubeconfig } => {
            teardown::execute(&job_id, kubeconfig, config.as_deref())
        }
        Completions { shell } => completions::execute(shell),
    }
}
