//! Tests for `kindrun name`.

use crate::support::*;

#[test]
fn test_name_strips_hyphens() {
    let t = Test::new();

    let output = t.cmd().args(["name", "--job-id", JOB_ID]).output().unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), CLUSTER);
}

#[test]
fn test_name_reads_job_id_from_environment() {
    let t = Test::new();

    let output = t
        .cmd()
        .arg("name")
        .env("BUILDKITE_JOB_ID", "0A1B-2C3D")
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "kind0a1b2c3d");
}

#[test]
fn test_name_uses_configured_prefix() {
    let t = Test::new();
    std::fs::write(
        t.dir.path().join("kindrun.toml"),
        "[cluster]\nname_prefix = \"ci\"\n",
    )
    .unwrap();

    let output = t.cmd().args(["name", "--job-id", JOB_ID]).output().unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "ciabc123xyz");
}

#[test]
fn test_name_rejects_unusable_job_id() {
    let t = Test::new();

    let output = t.cmd().args(["name", "--job-id", "---"]).output().unwrap();
    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "job id");
}
