//! Ephemeral environment lifecycle.
//!
//! ```text
//! Pending ──create──▶ Created ──inject──▶ Configured ──deploy──▶ InUse
//!    │                   │                    │                    │
//!    └───────────────────┴──────teardown──────┴────────────────────┘──▶ TornDown
//! ```
//!
//! Every operation takes the `EnvironmentHandle` explicitly. The handle is
//! normally owned by an `EnvironmentGuard` (see `core::guard`), which makes
//! teardown unconditional.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::config::{Config, ToolsConfig, WorkloadConfig};
use crate::core::constants;
use crate::core::deploy::DeploymentDescriptor;
use crate::core::exec::{Completion, ExecError, Executor, Invocation};
use crate::core::guard::EnvironmentGuard;
use crate::core::types::{EnvironmentName, LifecycleState, RegistryCredential};
use crate::error::{Error, Result, ToolFailure, GENERIC_FAILURE};

/// One ephemeral cluster and where its connection descriptor lives.
#[derive(Debug)]
pub struct EnvironmentHandle {
    name: EnvironmentName,
    kubeconfig: PathBuf,
    state: LifecycleState,
}

impl EnvironmentHandle {
    /// A handle whose cluster has not been created yet.
    pub fn pending(name: EnvironmentName, kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            name,
            kubeconfig: kubeconfig.into(),
            state: LifecycleState::Pending,
        }
    }

    pub fn name(&self) -> &EnvironmentName {
        &self.name
    }

    pub fn kubeconfig(&self) -> &Path {
        &self.kubeconfig
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn transition(&mut self, to: LifecycleState) {
        if self.state != to {
            debug!(cluster = %self.name, from = %self.state, to = %to, "state change");
            self.state = to;
        }
    }

    fn require_live(&self, operation: &'static str) -> Result<()> {
        if self.state.is_live() {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

/// A node that did not receive the registry credential.
#[derive(Debug)]
pub struct NodeFailure {
    pub node: String,
    pub error: Error,
}

/// Outcome of distributing registry credentials across nodes.
#[derive(Debug, Default)]
pub struct InjectionReport {
    pub configured: Vec<String>,
    pub failed: Vec<NodeFailure>,
}

impl InjectionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_nodes(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.node.as_str()).collect()
    }
}

/// Drives one environment through its lifecycle using external tools.
pub struct Lifecycle<E: Executor> {
    executor: E,
    tools: ToolsConfig,
    workload: WorkloadConfig,
}

impl<E: Executor> Lifecycle<E> {
    pub fn new(executor: E, config: &Config) -> Self {
        Self {
            executor,
            tools: config.tools.clone(),
            workload: config.workload.clone(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Arm teardown for `name`, then create the cluster.
    ///
    /// The guard exists before `kind create cluster` runs, so a failed or
    /// interrupted create still deletes whatever node containers it left.
    ///
    /// # Errors
    ///
    /// Returns `Error::Provisioning` if the cluster cannot be created; the
    /// teardown has already run by the time the error is returned.
    pub fn provision(
        &self,
        name: EnvironmentName,
        kubeconfig: impl Into<PathBuf>,
    ) -> Result<EnvironmentGuard<'_, E>> {
        let mut guard = EnvironmentGuard::arm(self, EnvironmentHandle::pending(name, kubeconfig));
        self.create(&mut guard)?;
        Ok(guard)
    }

    /// `kind create cluster --name <name>`.
    fn create(&self, handle: &mut EnvironmentHandle) -> Result<()> {
        info!(cluster = %handle.name, "creating cluster");

        let invocation = Invocation::new(&self.tools.kind)
            .args(["create", "cluster", "--name"])
            .arg(handle.name.as_str());

        let completion = self.execute(&invocation, |failure| Error::Provisioning {
            name: handle.name.to_string(),
            failure,
        })?;
        if !completion.success() {
            return Err(Error::Provisioning {
                name: handle.name.to_string(),
                failure: exited(&invocation, &completion),
            });
        }

        handle.transition(LifecycleState::Created);
        Ok(())
    }

    /// Write the cluster's internal kubeconfig to the handle's path.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigExport` if the cluster is not live, `kind` fails,
    /// or the file cannot be written.
    pub fn export_connection_config(&self, handle: &mut EnvironmentHandle) -> Result<PathBuf> {
        if !handle.state.is_live() {
            return Err(Error::ConfigExport {
                name: handle.name.to_string(),
                reason: format!("environment is {}", handle.state),
                code: None,
            });
        }

        let invocation = Invocation::new(&self.tools.kind)
            .args(["get", "kubeconfig", "--internal", "--name"])
            .arg(handle.name.as_str())
            .capture_stdout();

        let export_error = |reason: String, code: Option<i32>| Error::ConfigExport {
            name: handle.name.to_string(),
            reason,
            code,
        };

        let completion =
            self.execute(&invocation, |failure| export_error(failure.to_string(), None))?;
        if !completion.success() {
            return Err(export_error(
                exited(&invocation, &completion).to_string(),
                completion.code,
            ));
        }

        write_private(&handle.kubeconfig, &completion.stdout).map_err(|e| {
            export_error(
                format!("cannot write {}: {}", handle.kubeconfig.display(), e),
                None,
            )
        })?;

        info!(cluster = %handle.name, path = %handle.kubeconfig.display(), "kubeconfig exported");
        Ok(handle.kubeconfig.clone())
    }

    /// Copy the credential into every node and restart each kubelet.
    ///
    /// Per-node failures are collected in the report and do not abort the
    /// run. No step is retried.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialInjection` if the node list cannot be read
    /// or is empty, and `Error::Interrupted` on a termination signal.
    pub fn inject_registry_credentials(
        &self,
        handle: &mut EnvironmentHandle,
        credential: &RegistryCredential,
    ) -> Result<InjectionReport> {
        handle.require_live("inject registry credentials")?;

        let nodes = self.list_nodes(handle)?;
        let mut report = InjectionReport::default();

        for node in nodes {
            match self.configure_node(&node, credential) {
                Ok(()) => {
                    debug!(node = %node, "credential installed");
                    report.configured.push(node);
                }
                Err(Error::Interrupted(signal)) => return Err(Error::Interrupted(signal)),
                Err(error) => {
                    warn!(node = %node, error = %error, "credential injection failed on node");
                    report.failed.push(NodeFailure { node, error });
                }
            }
        }

        if report.is_complete() {
            info!(
                cluster = %handle.name,
                nodes = report.configured.len(),
                registry = %credential.registry(),
                "registry credentials injected"
            );
        } else {
            warn!(
                cluster = %handle.name,
                configured = report.configured.len(),
                failed = report.failed.len(),
                "registry credentials only partially injected, image pulls may fail"
            );
        }

        handle.transition(LifecycleState::Configured);
        Ok(report)
    }

    fn list_nodes(&self, handle: &EnvironmentHandle) -> Result<Vec<String>> {
        let invocation = Invocation::new(&self.tools.kind)
            .args(["get", "nodes", "--name"])
            .arg(handle.name.as_str())
            .capture_stdout();

        let completion = self.execute(&invocation, |failure| Error::CredentialInjection {
            reason: failure.to_string(),
            code: None,
        })?;
        if !completion.success() {
            return Err(Error::CredentialInjection {
                reason: format!("cannot list nodes: {}", exited(&invocation, &completion)),
                code: completion.code,
            });
        }

        let nodes: Vec<String> = completion
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if nodes.is_empty() {
            return Err(Error::CredentialInjection {
                reason: format!("cluster {} reported no nodes", handle.name),
                code: None,
            });
        }
        Ok(nodes)
    }

    fn configure_node(&self, node: &str, credential: &RegistryCredential) -> Result<()> {
        let copy = Invocation::new(&self.tools.docker)
            .arg("cp")
            .arg(credential.path().to_string_lossy())
            .arg(format!("{}:{}", node, constants::KUBELET_CREDENTIAL_PATH));
        let restart = Invocation::new(&self.tools.docker).args([
            "exec",
            node,
            "systemctl",
            "restart",
            constants::KUBELET_SERVICE,
        ]);

        for invocation in [copy, restart] {
            let completion = self.execute(&invocation, |failure| Error::CredentialInjection {
                reason: format!("{}: {}", node, failure),
                code: None,
            })?;
            if !completion.success() {
                return Err(Error::CredentialInjection {
                    reason: format!("{}: {}", node, exited(&invocation, &completion)),
                    code: completion.code,
                });
            }
        }
        Ok(())
    }

    /// Install the descriptor's chart with Helm.
    ///
    /// # Errors
    ///
    /// Returns `Error::Deployment` carrying Helm's exit code.
    pub fn deploy(
        &self,
        handle: &mut EnvironmentHandle,
        descriptor: &DeploymentDescriptor,
    ) -> Result<()> {
        handle.require_live("deploy")?;
        info!(
            cluster = %handle.name,
            release = %descriptor.release,
            chart = %descriptor.chart,
            images = descriptor.images.len(),
            "deploying"
        );

        let invocation = Invocation::new(&self.tools.helm)
            .args(descriptor.helm_args())
            .env("KUBECONFIG", handle.kubeconfig.to_string_lossy());

        let completion = self.execute(&invocation, Error::Deployment)?;
        if !completion.success() {
            return Err(Error::Deployment(exited(&invocation, &completion)));
        }

        handle.transition(LifecycleState::InUse);
        Ok(())
    }

    /// Run the workload runner against the environment.
    ///
    /// The runner's exit code is returned unchanged; a runner killed by a
    /// signal reports the generic failure code.
    ///
    /// # Errors
    ///
    /// Returns `Error::Workload` if the runner cannot be started.
    pub fn run_workload(&self, handle: &mut EnvironmentHandle, workload_id: &str) -> Result<i32> {
        handle.require_live("run workload")?;
        handle.transition(LifecycleState::InUse);
        info!(cluster = %handle.name, workload = workload_id, "running workload");

        let invocation = Invocation::new(&self.workload.program)
            .args(self.workload.args.iter().cloned())
            .arg(workload_id)
            .env("KUBECONFIG", handle.kubeconfig.to_string_lossy());

        let completion = match self.executor.execute(&invocation) {
            Ok(completion) => completion,
            Err(ExecError::Interrupted(signal)) => return Err(Error::Interrupted(signal)),
            Err(ExecError::Spawn(source)) | Err(ExecError::Io(source)) => {
                return Err(Error::Workload {
                    program: self.workload.program.clone(),
                    source,
                })
            }
        };

        let code = completion.code.unwrap_or(GENERIC_FAILURE);
        info!(workload = workload_id, code, "workload finished");
        Ok(code)
    }

    /// Delete the cluster and its kubeconfig.
    ///
    /// A handle that is already torn down is left alone. Otherwise the
    /// handle ends up `TornDown` even if deletion fails, so teardown is
    /// attempted exactly once. Termination signals do not interrupt it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Teardown` if `kind delete cluster` fails.
    pub fn teardown(&self, handle: &mut EnvironmentHandle) -> Result<()> {
        if handle.state == LifecycleState::TornDown {
            debug!(cluster = %handle.name, "already torn down");
            return Ok(());
        }

        info!(cluster = %handle.name, state = %handle.state, "tearing down");
        handle.transition(LifecycleState::TornDown);

        match std::fs::remove_file(&handle.kubeconfig) {
            Ok(()) => debug!(path = %handle.kubeconfig.display(), "kubeconfig removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %handle.kubeconfig.display(), error = %e, "cannot remove kubeconfig"),
        }

        let invocation = Invocation::new(&self.tools.kind)
            .args(["delete", "cluster", "--name"])
            .arg(handle.name.as_str())
            .uninterruptible();

        let teardown_error = |failure| Error::Teardown {
            name: handle.name.to_string(),
            failure,
        };
        let completion = self.execute(&invocation, teardown_error)?;
        if !completion.success() {
            return Err(teardown_error(exited(&invocation, &completion)));
        }

        info!(cluster = %handle.name, "cluster deleted");
        Ok(())
    }

    /// Run `invocation`, mapping start-up failures with `on_failure` and
    /// signals to `Error::Interrupted`.
    fn execute<F>(&self, invocation: &Invocation, on_failure: F) -> Result<Completion>
    where
        F: FnOnce(ToolFailure) -> Error,
    {
        self.executor.execute(invocation).map_err(|e| match e {
            ExecError::Interrupted(signal) => Error::Interrupted(signal),
            ExecError::Spawn(source) | ExecError::Io(source) => on_failure(ToolFailure::Spawn {
                program: invocation.program.clone(),
                source,
            }),
        })
    }
}

fn exited(invocation: &Invocation, completion: &Completion) -> ToolFailure {
    ToolFailure::Exited {
        program: invocation.to_string(),
        code: completion.code,
    }
}

/// Write `contents` to `path`, creating parents, readable only by the owner.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
