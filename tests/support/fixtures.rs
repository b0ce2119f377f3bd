//! Test fixtures and constants.

pub const ACCOUNT_ID: &str = "123456789012";
pub const BUILD_ID: &str = "build-77";
pub const JOB_ID: &str = "abc-123-xyz";
pub const RUNTIME: &str = "3.7";

/// Cluster name derived from `JOB_ID`.
pub const CLUSTER: &str = "kindabc123xyz";

/// Stub tool bodies; each runs after the invocation has been logged.
///
/// Behavior is steered through `STUB_*` environment variables so a single
/// set of scripts covers every scenario.
pub const STUB_TOOLS: &[(&str, &str)] = &[
    (
        "kind",
        r#"case "$1 $2" in
  "create cluster") exit "${STUB_KIND_CREATE_EXIT:-0}" ;;
  "get kubeconfig") echo "apiVersion: v1"; echo "kind: Config" ;;
  "get nodes") echo "$4-control-plane"; echo "$4-worker" ;;
  "delete cluster") exit "${STUB_KIND_DELETE_EXIT:-0}" ;;
esac
exit 0
"#,
    ),
    (
        "docker",
        r#"if [ "$1" = "exec" ] && [ "$2" = "$STUB_DOCKER_FAIL_NODE" ]; then exit 1; fi
exit 0
"#,
    ),
    ("helm", "exit \"${STUB_HELM_EXIT:-0}\"\n"),
    ("aws", "echo stub-token\n"),
    (
        "tox",
        r#"test -f "$KUBECONFIG" || exit 99
if [ -n "$STUB_TOX_SLEEP" ]; then exec sleep "$STUB_TOX_SLEEP"; fi
exit "${STUB_TOX_EXIT:-0}"
"#,
    ),
];
