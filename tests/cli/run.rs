//! Tests for `kindrun run`.

use crate::support::*;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[test]
fn test_run_success_tears_down_once() {
    let t = Test::new();

    let output = t.run_cmd("py37").output().unwrap();
    assert_success(&output);

    let calls = t.calls();
    assert_eq!(calls.first().unwrap(), &format!("kind create cluster --name {}", CLUSTER));
    assert_single_teardown(&calls, CLUSTER);
    assert_eq!(t.count("tox -e py37"), 1);
    assert!(!t.kubeconfig_path().exists());
}

#[test]
fn test_run_exits_with_workload_code() {
    let t = Test::new();

    let output = t.run_cmd("py37").env("STUB_TOX_EXIT", "7").output().unwrap();
    assert_exit_code(&output, 7);
    assert_single_teardown(&t.calls(), CLUSTER);
    assert_eq!(
        t.calls().last().unwrap(),
        &format!("kind delete cluster --name {}", CLUSTER)
    );
}

#[test]
fn test_run_workload_sees_kubeconfig() {
    let t = Test::new();

    // The tox stub exits 99 when $KUBECONFIG does not point at a file.
    let output = t.run_cmd("py37").output().unwrap();
    assert_exit_code(&output, 0);
}

#[test]
fn test_run_create_failure_exits_nonzero_and_tears_down() {
    let t = Test::new();

    let output = t
        .run_cmd("py37")
        .env("STUB_KIND_CREATE_EXIT", "3")
        .output()
        .unwrap();
    assert_exit_code(&output, 3);
    assert_stderr_contains(&output, "failed to provision cluster");
    assert_single_teardown(&t.calls(), CLUSTER);
    assert_eq!(t.count("helm"), 0);
}

#[test]
fn test_run_deploy_failure_propagates_helm_code() {
    let t = Test::new();

    let output = t.run_cmd("py37").env("STUB_HELM_EXIT", "4").output().unwrap();
    assert_exit_code(&output, 4);
    assert_eq!(t.count("tox"), 0);
    assert_single_teardown(&t.calls(), CLUSTER);
}

#[test]
fn test_run_partial_injection_still_deploys() {
    let t = Test::new();

    let output = t
        .run_cmd("py37")
        .env("STUB_DOCKER_FAIL_NODE", format!("{}-worker", CLUSTER))
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "registry credentials missing on");
    assert_eq!(t.count("helm install"), 1);
    assert_eq!(t.count("tox"), 1);
}

#[test]
fn test_run_missing_tool_creates_nothing() {
    let t = Test::new();
    std::fs::write(
        t.dir.path().join("kindrun.toml"),
        "[tools]\nhelm = \"kindrun-test-no-such-helm\"\n",
    )
    .unwrap();

    let output = t.run_cmd("py37").output().unwrap();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "`kindrun-test-no-such-helm` not found");
    assert!(t.calls().is_empty());
}

#[test]
fn test_run_missing_environment_fails() {
    let t = Test::new();

    let output = t.cmd().args(["run", "py37"]).output().unwrap();
    assert!(!output.status.success());
    assert!(t.calls().is_empty());
}

#[test]
fn test_sigterm_tears_down() {
    let t = Test::new();
    let log = t.log_path();

    let mut child = Command::new(env!("CARGO_BIN_EXE_kindrun"))
        .args(["run", "py37", "--kubeconfig"])
        .arg(t.kubeconfig_path())
        .current_dir(t.dir.path())
        .env("PATH", t.path_env())
        .env("NO_COLOR", "1")
        .env("AWS_ACCOUNT_ID", ACCOUNT_ID)
        .env("BUILDKITE_BUILD_ID", BUILD_ID)
        .env("BUILDKITE_JOB_ID", JOB_ID)
        .env("TOX_PY_VERSION", RUNTIME)
        .env("STUB_TOX_SLEEP", "30")
        .env_remove("KINDRUN_CONFIG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let started = Instant::now();
    while !std::fs::read_to_string(&log)
        .unwrap_or_default()
        .contains("tox -e py37")
    {
        assert!(
            started.elapsed() < Duration::from_secs(30),
            "workload never started"
        );
        std::thread::sleep(Duration::from_millis(50));
    }

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(143));
    assert!(started.elapsed() < Duration::from_secs(25));
    assert_single_teardown(&t.calls(), CLUSTER);
}
