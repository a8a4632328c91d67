//! CLI integration tests for `staderd init`, `config`, `version` and the
//! startup failure paths that need no upstream endpoints.

#![allow(deprecated)] // Command::cargo_bin is deprecated but still works

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn staderd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("staderd").expect("find staderd binary");
    cmd.arg("--home").arg(home.path()).arg("--log-no-color");
    cmd
}

#[test]
fn test_cli_init_writes_config() {
    let home = TempDir::new().expect("create temp dir");

    staderd(&home)
        .arg("init")
        .arg("--execution-rpc-url")
        .arg("http://el.example:8545")
        .arg("--node-address")
        .arg("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully initialized"))
        .stdout(predicate::str::contains("contracts.permissionless-node-registry"));

    let config_path = home.path().join("config").join("node.toml");
    let content = std::fs::read_to_string(&config_path).expect("config written");
    assert!(content.contains("execution-rpc-url = \"http://el.example:8545\""));
    assert!(content.contains("node-address"));
    assert!(content.contains("[refresh]"));
    assert!(content.contains("[metrics]"));
}

#[test]
fn test_cli_init_refuses_to_overwrite() {
    let home = TempDir::new().expect("create temp dir");
    staderd(&home).arg("init").assert().success();

    staderd(&home)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--overwrite"));

    staderd(&home)
        .arg("init")
        .arg("--overwrite")
        .assert()
        .success();
}

#[test]
fn test_cli_config_show_and_path() {
    let home = TempDir::new().expect("create temp dir");
    staderd(&home)
        .arg("init")
        .arg("--beacon-url")
        .arg("http://cl.example:5052")
        .assert()
        .success();

    staderd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("beacon-url = \"http://cl.example:5052\""))
        .stdout(predicate::str::contains("interval-secs = 60"));

    staderd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node.toml"));
}

#[test]
fn test_cli_config_show_without_init() {
    let home = TempDir::new().expect("create temp dir");
    staderd(&home)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staderd init"));
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().expect("create temp dir");
    staderd(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("staderd: "));

    staderd(&home)
        .args(["version", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"staderd\""));
}

#[test]
fn test_cli_start_without_config_fails_helpfully() {
    let home = TempDir::new().expect("create temp dir");
    staderd(&home)
        .arg("start")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("staderd init"));
}

#[test]
fn test_cli_start_rejects_unset_contracts() {
    let home = TempDir::new().expect("create temp dir");
    staderd(&home).arg("init").assert().success();

    staderd(&home)
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("contract addresses not set"));
}

#[test]
fn test_cli_status_without_config_fails_helpfully() {
    let home = TempDir::new().expect("create temp dir");
    for command in ["status", "network"] {
        staderd(&home)
            .arg(command)
            .assert()
            .failure()
            .stderr(predicate::str::contains("staderd init"));
    }
}
