//! Smoke tests for the playcheck CLI
//!
//! None of these launch a browser.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn playcheck() -> Command {
    let mut cmd = Command::cargo_bin("playcheck").expect("playcheck binary should exist");
    cmd.env_remove("RUST_LOG")
        .env_remove("PLAYCHECK_CONFIG")
        .env_remove("PLAYCHECK_RETRIES")
        .env_remove("PLAYCHECK_HEADLESS");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    playcheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    playcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SauceDemo"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_no_args_requires_subcommand() {
    playcheck().assert().failure();
}

#[test]
fn test_run_help_lists_flags() {
    playcheck()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--retries"))
        .stdout(predicate::str::contains("--fail-fast"))
        .stdout(predicate::str::contains("--headed"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_all_sites() {
    playcheck()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("saucedemo::login"))
        .stdout(predicate::str::contains("the_internet::auth::form_authentication"))
        .stdout(predicate::str::contains("todomvc::app"));
}

#[test]
fn test_list_by_tag() {
    playcheck()
        .args(["list", "--tag", "todomvc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("should add a new todo"))
        .stdout(predicate::str::contains("saucedemo::").not());
}

#[test]
fn test_list_json() {
    let output = playcheck()
        .args(["list", "--tag", "todomvc", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["id"], "todomvc::app");
}

#[test]
fn test_list_no_match() {
    playcheck()
        .args(["list", "-f", "zzz-no-such-scenario"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 scenarios in 0 suites"));
}

// ============================================================================
// config and errors
// ============================================================================

#[test]
fn test_config_shows_defaults() {
    playcheck()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("headless: true"))
        .stdout(predicate::str::contains("saucedemo.com"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("playcheck.yaml");
    fs::write(&path, "retries: 4\n").unwrap();
    playcheck()
        .args(["config", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("retries: 4"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "retries: [not a number\n").unwrap();
    playcheck()
        .args(["config", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_config_file_fails() {
    playcheck()
        .args(["config", "-c", "/nonexistent/playcheck.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_bad_env_value_fails() {
    playcheck()
        .arg("config")
        .env("PLAYCHECK_RETRIES", "many")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLAYCHECK_RETRIES"));
}

#[test]
fn test_run_with_no_match_fails_before_launch() {
    playcheck()
        .args(["run", "-f", "zzz-no-such-scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenarios match"));
}

#[test]
fn test_unknown_report_format_rejected() {
    playcheck()
        .args(["run", "--report", "html"])
        .assert()
        .failure();
}
