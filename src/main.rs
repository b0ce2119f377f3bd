//! kindrun - ephemeral kind clusters for CI test runs.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kindrun::cli::output;
use kindrun::cli::{execute, Cli, LogFormat};
use kindrun::core::constants;
use kindrun::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("kindrun=debug")
        } else {
            EnvFilter::new("kindrun=info")
        }
    });

    let (text, json) = match cli.log_format {
        LogFormat::Text => (
            Some(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();

    let code = match execute(cli.command, cli.config) {
        Ok(code) => code,
        Err(e) => {
            let suggestion = match &e {
                Error::MissingTool(_) => Some("install it or point [tools] in kindrun.toml at it"),
                Error::Config(ConfigError::Missing(_)) => {
                    Some("set AWS_ACCOUNT_ID, BUILDKITE_BUILD_ID, BUILDKITE_JOB_ID and TOX_PY_VERSION")
                }
                _ => None,
            };

            output::error(&e.to_string());
            if let Some(hint) = suggestion {
                output::hint(hint);
            }
            e.exit_code()
        }
    };

    std::process::exit(code);
}
