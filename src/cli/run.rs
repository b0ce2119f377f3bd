//! Run command.
//!
//! Provisions an ephemeral cluster, deploys into it, runs the workload and
//! tears the cluster down. Exits with the workload's exit code.

use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::core::config::{Config, RunSettings};
use crate::core::exec::SystemExecutor;
use crate::core::interrupt::Interrupt;
use crate::core::lifecycle::Lifecycle;
use crate::core::pipeline;
use crate::error::Result;

/// Run `selector` in a fresh cluster.
pub fn execute(
    selector: &str,
    settings: RunSettings,
    kubeconfig: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<i32> {
    let mut config = Config::load(config_path)?;
    if let Some(path) = kubeconfig {
        config.cluster.kubeconfig = path;
    }

    let interrupt = Interrupt::install();
    let lifecycle = Lifecycle::new(SystemExecutor::new(interrupt), &config);
    let outcome = pipeline::run(&lifecycle, &config, &settings, selector)?;

    if !outcome.unconfigured_nodes.is_empty() {
        output::warn(&format!(
            "registry credentials missing on: {}",
            outcome.unconfigured_nodes.join(", ")
        ));
    }

    match &outcome.teardown_error {
        Some(e) => {
            output::warn(&e.to_string());
            output::hint(&format!("run: kindrun teardown --job-id {}", settings.job_id));
        }
        None => output::success(&format!(
            "cluster {} torn down",
            output::cluster(outcome.environment.as_str())
        )),
    }
    output::kv("workload exit code:", outcome.exit_code);

    Ok(outcome.exit_code)
}
