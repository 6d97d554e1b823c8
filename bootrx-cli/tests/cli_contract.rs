//! Integration tests for core CLI contract behavior.

use {assert_cmd::Command, predicates::prelude::*};

fn cli_cmd() -> Command {
    let mut cmd = Command::cargo_bin("bootrx").expect("binary builds");
    cmd.env_remove("BOOTRX_PORT")
        .env_remove("BOOTRX_BAUD")
        .env_remove("BOOTRX_PARTITIONS");
    cmd
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    cli_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootrx"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    cli_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bootrx"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn missing_port_is_a_usage_error() {
    cli_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}

#[test]
fn bad_partition_table_fails_before_opening_the_port() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("parts.toml");
    std::fs::write(&path, "not valid toml [[[").expect("write");

    cli_cmd()
        .args(["--port", "/dev/null"])
        .args(["--address", "0x10000"])
        .arg("--partitions")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("partition table"));
}

#[test]
fn out_of_partition_address_is_rejected() {
    cli_cmd()
        .args(["--port", "/dev/null"])
        .args(["--address", "0x1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside every partition"));
}
