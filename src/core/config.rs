//! Configuration file management.
//!
//! Handles reading and validating `kindrun.toml`. Every field has a default,
//! so the file is optional; values given on the command line or through the
//! CI environment variables are applied on top by the CLI layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Project configuration stored in `kindrun.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub registry: RegistryConfig,
    pub deploy: DeployConfig,
    pub workload: WorkloadConfig,
    pub tools: ToolsConfig,
}

/// `[cluster]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    /// Prepended to the sanitized job identifier.
    pub name_prefix: String,
    /// Where the connection descriptor is written.
    pub kubeconfig: PathBuf,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name_prefix: constants::DEFAULT_NAME_PREFIX.to_string(),
            kubeconfig: PathBuf::from(constants::DEFAULT_KUBECONFIG),
        }
    }
}

/// `[registry]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub region: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            region: constants::DEFAULT_REGION.to_string(),
        }
    }
}

/// `[deploy]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    pub release: String,
    pub chart: String,
    /// Image tag template; `{build_id}` and `{runtime}` are substituted.
    pub tag: String,
    pub images: Vec<ImageConfig>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            release: constants::DEFAULT_RELEASE.to_string(),
            chart: constants::DEFAULT_CHART.to_string(),
            tag: constants::DEFAULT_TAG_TEMPLATE.to_string(),
            images: vec![ImageConfig {
                key: "dagit.image".to_string(),
                name: "dagster-k8s-demo".to_string(),
            }],
        }
    }
}

/// One `[[deploy.images]]` entry: a chart values key and the image it pulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    pub key: String,
    pub name: String,
}

/// `[workload]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    pub program: String,
    /// Arguments placed before the workload selector.
    pub args: Vec<String>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            program: constants::DEFAULT_WORKLOAD_PROGRAM.to_string(),
            args: vec!["-e".to_string()],
        }
    }
}

/// `[tools]` section: program names or paths of the external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub kind: String,
    pub docker: String,
    pub helm: String,
    pub aws: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            kind: "kind".to_string(),
            docker: "docker".to_string(),
            helm: "helm".to_string(),
            aws: "aws".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `kindrun.toml` in the
    /// current directory is used when present, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile`, `ConfigError::Parse`, or a validation
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(constants::CONFIG_FILE);
                if !local.exists() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                local
            }
        };

        Self::from_file(&path)
    }

    /// Load and validate a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on the first violation.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.cluster.name_prefix;
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid(
                "cluster.name_prefix",
                format!("'{}' must be non-empty and only contain a-z, 0-9", prefix),
            ));
        }

        require_non_empty("cluster.kubeconfig", &self.cluster.kubeconfig.to_string_lossy())?;
        require_non_empty("registry.region", &self.registry.region)?;
        require_non_empty("deploy.release", &self.deploy.release)?;
        require_non_empty("deploy.chart", &self.deploy.chart)?;
        require_non_empty("deploy.tag", &self.deploy.tag)?;
        require_non_empty("workload.program", &self.workload.program)?;

        let mut seen = BTreeSet::new();
        for image in &self.deploy.images {
            require_non_empty("deploy.images.key", &image.key)?;
            require_non_empty("deploy.images.name", &image.name)?;
            if !seen.insert(image.key.as_str()) {
                return Err(invalid(
                    "deploy.images.key",
                    format!("duplicate key '{}'", image.key),
                ));
            }
        }

        for (field, tool) in [
            ("tools.kind", &self.tools.kind),
            ("tools.docker", &self.tools.docker),
            ("tools.helm", &self.tools.helm),
            ("tools.aws", &self.tools.aws),
        ] {
            require_non_empty(field, tool)?;
        }

        Ok(())
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty".to_string()));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: String) -> crate::error::Error {
    ConfigError::InvalidValue { field, reason }.into()
}

/// Per-run values supplied by the CI environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Registry account identifier.
    pub account_id: String,
    pub build_id: String,
    pub job_id: String,
    /// Runtime selector baked into the image tag.
    pub runtime: String,
}

impl RunSettings {
    /// Reject blank values; CI systems sometimes export variables empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first blank setting.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("account id", &self.account_id),
            ("build id", &self.build_id),
            ("job id", &self.job_id),
            ("runtime", &self.runtime),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(field).into());
            }
        }
        Ok(())
    }
}
