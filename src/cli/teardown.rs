//! Teardown command.
//!
//! Deletes the cluster a previous run created for a job identifier. Safe to
//! run when the cluster is already gone.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::exec::{Executor, SystemExecutor};
use crate::core::interrupt::Interrupt;
use crate::core::lifecycle::{EnvironmentHandle, Lifecycle};
use crate::core::types::EnvironmentName;
use crate::error::{Error, Result};

/// Tear down the cluster for `job_id`.
pub fn execute(
    job_id: &str,
    kubeconfig: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<i32> {
    let config = Config::load(config_path)?;
    let name = EnvironmentName::derive(&config.cluster.name_prefix, job_id)?;
    let kubeconfig = kubeconfig.unwrap_or_else(|| config.cluster.kubeconfig.clone());

    let executor = SystemExecutor::new(Interrupt::install());
    if !executor.locate(&config.tools.kind) {
        return Err(Error::MissingTool(config.tools.kind.clone()));
    }

    info!(cluster = %name, "manual teardown");
    let lifecycle = Lifecycle::new(executor, &config);
    let mut handle = EnvironmentHandle::pending(name, kubeconfig);
    lifecycle.teardown(&mut handle)?;

    output::success(&format!(
        "cluster {} torn down",
        output::cluster(handle.name().as_str())
    ));
    Ok(0)
}
