//! Domain types for the environment lifecycle.

use std::fmt;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use zeroize::Zeroizing;

use crate::error::{ConfigError, Result};

/// Name of one ephemeral cluster.
///
/// Only lowercase ASCII letters and digits survive sanitization, so the name
/// is valid both as a kind cluster name and as a docker container prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    /// Derive a cluster name from a prefix and a job identifier.
    ///
    /// `("kind", "abc-123-xyz")` becomes `kindabc123xyz`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the job identifier contains no
    /// usable characters.
    pub fn derive(prefix: &str, job_id: &str) -> Result<Self> {
        let suffix = sanitize(job_id);
        if suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "job id",
                reason: format!("'{}' has no letters or digits", job_id),
            }
            .into());
        }
        Ok(Self(format!("{}{}", sanitize(prefix), suffix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip everything outside `[a-z0-9]` after lowercasing.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Where an environment handle is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Teardown is armed but the cluster is not confirmed to exist.
    Pending,
    Created,
    Configured,
    InUse,
    TornDown,
}

impl LifecycleState {
    /// True once provisioning succeeded and teardown has not happened.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Created | Self::Configured | Self::InUse)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Created => "created",
            Self::Configured => "configured",
            Self::InUse => "in-use",
            Self::TornDown => "torn-down",
        };
        f.write_str(s)
    }
}

/// Registry credential material staged for copying into cluster nodes.
///
/// The rendered docker `config.json` lives only in a temporary file that is
/// removed when the credential is dropped. The in-memory copy is zeroized as
/// soon as the file is written.
pub struct RegistryCredential {
    registry: String,
    file: NamedTempFile,
}

impl RegistryCredential {
    /// Stage rendered docker config contents for `registry`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temporary file cannot be written.
    pub fn stage(registry: impl Into<String>, contents: Zeroizing<String>) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("kindrun-registry-")
            .suffix(".json")
            .tempfile()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        drop(contents);

        Ok(Self {
            registry: registry.into(),
            file,
        })
    }

    /// Registry host the credential authenticates against.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("registry", &self.registry)
            .field("path", &self.file.path())
            .finish_non_exhaustive()
    }
}
