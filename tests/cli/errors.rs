//! Tests for error handling and CLI flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("teardown")));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    t.cmd().arg("unknown-command").assert().failure();
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    t.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kindrun"));
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_kindrun"));
}

#[test]
fn test_invalid_config_file_reported() {
    let t = Test::new();
    std::fs::write(t.dir.path().join("kindrun.toml"), "[cluster\n").unwrap();

    t.cmd()
        .args(["name", "--job-id", JOB_ID])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn test_explicit_config_via_environment() {
    let t = Test::new();
    let path = t.dir.path().join("custom.toml");
    std::fs::write(&path, "[cluster]\nname_prefix = \"x\"\n").unwrap();

    t.cmd()
        .args(["name", "--job-id", "j-1"])
        .env("KINDRUN_CONFIG", &path)
        .assert()
        .success()
        .stdout("xj1\n");
}

#[test]
fn test_verbose_logs_to_stderr_only() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["--verbose", "name", "--job-id", JOB_ID])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), format!("{}\n", CLUSTER));
}

#[test]
fn test_json_log_format_accepted() {
    let t = Test::new();

    let output = t
        .run_cmd("py37")
        .args(["--log-format", "json"])
        .output()
        .unwrap();
    assert_success(&output);
    let err = stderr(&output);
    assert!(
        err.lines().any(|l| l.starts_with('{') && l.contains("\"level\"")),
        "expected JSON log lines, got: {}",
        err
    );
}
