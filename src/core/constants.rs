//! Constants used throughout kindrun.
//!
//! Centralizes magic strings and default configuration values.

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "kindrun.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "KINDRUN_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "KINDRUN_LOG";

/// Prefix prepended to sanitized job identifiers.
pub const DEFAULT_NAME_PREFIX: &str = "kind";

/// Where the exported kubeconfig is written.
pub const DEFAULT_KUBECONFIG: &str = "/tmp/kubeconfig";

/// Default registry region.
pub const DEFAULT_REGION: &str = "us-west-1";

/// Path inside each node where the kubelet reads registry credentials.
pub const KUBELET_CREDENTIAL_PATH: &str = "/var/lib/kubelet/config.json";

/// systemd unit restarted on each node after credentials are copied.
pub const KUBELET_SERVICE: &str = "kubelet.service";

/// Username paired with the token in ECR docker auth entries.
pub const REGISTRY_USER: &str = "AWS";

/// Default Helm release name.
pub const DEFAULT_RELEASE: &str = "dagster";

/// Default Helm chart reference.
pub const DEFAULT_CHART: &str = "helm/dagster";

/// Default image tag template.
pub const DEFAULT_TAG_TEMPLATE: &str = "{build_id}-{runtime}";

/// Default workload runner.
pub const DEFAULT_WORKLOAD_PROGRAM: &str = "tox";
