//! End-to-end run of one ephemeral environment.
//!
//! provision → export kubeconfig → fetch registry credential → inject →
//! deploy → run workload → teardown. Any error stops the forward steps; the
//! guard tears the environment down before the error reaches the caller.

use tracing::{info, warn};

use crate::core::config::{Config, RunSettings};
use crate::core::deploy::DeploymentDescriptor;
use crate::core::exec::Executor;
use crate::core::lifecycle::Lifecycle;
use crate::core::registry;
use crate::core::types::EnvironmentName;
use crate::error::{Error, Result};

/// What a completed run looked like.
#[derive(Debug)]
pub struct RunOutcome {
    pub environment: EnvironmentName,
    /// Exit code of the workload runner.
    pub exit_code: i32,
    /// Nodes that did not receive registry credentials.
    pub unconfigured_nodes: Vec<String>,
    /// Teardown failure after the workload finished; does not change the
    /// exit code.
    pub teardown_error: Option<Error>,
}

/// Check that every external tool the run needs can be found.
///
/// # Errors
///
/// Returns `Error::MissingTool` for the first tool that cannot be located.
pub fn preflight<E: Executor>(executor: &E, config: &Config) -> Result<()> {
    for tool in [
        &config.tools.kind,
        &config.tools.docker,
        &config.tools.helm,
        &config.tools.aws,
        &config.workload.program,
    ] {
        if !executor.locate(tool) {
            return Err(Error::MissingTool(tool.clone()));
        }
    }
    Ok(())
}

/// Run `selector` in a fresh environment and tear it down.
///
/// # Errors
///
/// Returns the first failing step's error. By then the environment has
/// already been torn down.
pub fn run<E: Executor>(
    lifecycle: &Lifecycle<E>,
    config: &Config,
    settings: &RunSettings,
    selector: &str,
) -> Result<RunOutcome> {
    settings.validate()?;
    preflight(lifecycle.executor(), config)?;

    let name = EnvironmentName::derive(&config.cluster.name_prefix, &settings.job_id)?;
    info!(cluster = %name, selector, "starting run");

    let mut env = lifecycle.provision(name, config.cluster.kubeconfig.clone())?;
    lifecycle.export_connection_config(&mut env)?;

    let report = {
        let credential = registry::fetch_credential(
            lifecycle.executor(),
            &config.tools.aws,
            &settings.account_id,
            &config.registry.region,
        )?;
        lifecycle.inject_registry_credentials(&mut env, &credential)?
    };
    let unconfigured_nodes: Vec<String> = report
        .failed_nodes()
        .into_iter()
        .map(String::from)
        .collect();

    let descriptor = DeploymentDescriptor::from_config(config, settings);
    lifecycle.deploy(&mut env, &descriptor)?;

    let exit_code = lifecycle.run_workload(&mut env, selector)?;

    let environment = env.name().clone();
    let teardown_error = env.release().err();
    if let Some(e) = &teardown_error {
        warn!(cluster = %environment, error = %e, "teardown failed after workload completed");
    }

    Ok(RunOutcome {
        environment,
        exit_code,
        unconfigured_nodes,
        teardown_error,
    })
}
