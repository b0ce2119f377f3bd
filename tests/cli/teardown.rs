//! Tests for `kindrun teardown`.

use crate::support::*;

#[test]
fn test_teardown_deletes_cluster_and_kubeconfig() {
    let t = Test::new();
    let kubeconfig = t.kubeconfig_path();
    std::fs::create_dir_all(kubeconfig.parent().unwrap()).unwrap();
    std::fs::write(&kubeconfig, "apiVersion: v1\n").unwrap();

    let output = t
        .cmd()
        .args(["teardown", "--job-id", JOB_ID, "--kubeconfig"])
        .arg(&kubeconfig)
        .output()
        .unwrap();
    assert_success(&output);
    assert_single_teardown(&t.calls(), CLUSTER);
    assert!(!kubeconfig.exists());
}

#[test]
fn test_teardown_twice_succeeds() {
    let t = Test::new();

    for _ in 0..2 {
        let output = t
            .cmd()
            .args(["teardown", "--job-id", JOB_ID, "--kubeconfig"])
            .arg(t.kubeconfig_path())
            .output()
            .unwrap();
        assert_success(&output);
    }
    assert_eq!(t.count("kind delete cluster"), 2);
}

#[test]
fn test_teardown_failure_propagates_kind_code() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["teardown", "--job-id", JOB_ID, "--kubeconfig"])
        .arg(t.kubeconfig_path())
        .env("STUB_KIND_DELETE_EXIT", "2")
        .output()
        .unwrap();
    assert_exit_code(&output, 2);
    assert_stderr_contains(&output, "failed to tear down");
}
