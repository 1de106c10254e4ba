//! Integration tests for the `topo` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("topo");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("network"))
        .stdout(predicate::str::contains("truss"))
        .stdout(predicate::str::contains("backends"));
}

#[test]
fn test_backends_lists_default_engine() {
    let mut cmd = cargo_bin_cmd!("topo");
    cmd.arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_truss_grid_json() {
    let mut cmd = cargo_bin_cmd!("topo");
    let output = cmd
        .args([
            "truss", "grid", "--nx", "2", "--ny", "2", "--support", "0", "--support", "1",
            "--load", "3", "--fy", "-1000", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let design: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(design["report"]["status"], "optimal");
    assert!(design["aggregates"]["equilibrium_verified"].as_bool().unwrap());
}

#[test]
fn test_network_ring_reads_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("topo.toml");
    fs::write(&config, "[network]\nbudget = 0.0\ndegree_bounds = { min = 2, max = 4 }\n").unwrap();

    let mut cmd = cargo_bin_cmd!("topo");
    cmd.args(["network", "ring", "--nodes", "4", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: Fallback"));
}

#[test]
fn test_bad_config_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("topo.toml");
    fs::write(&config, "[network]\nbudget = \"lots\"\n").unwrap();

    let mut cmd = cargo_bin_cmd!("topo");
    cmd.args(["network", "ring", "--config"])
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_config_error_fails() {
    let mut cmd = cargo_bin_cmd!("topo");
    cmd.args(["network", "ring", "--nodes", "2"]).assert().failure();
}
