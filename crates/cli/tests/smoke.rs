// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Smoke tests for the tally binary

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tally(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tally"));
    cmd.current_dir(dir.path())
        .env("TALLY_DATA_DIR", dir.path().join("data"))
        .env("RUST_LOG", "off")
        .env_remove("TALLY_CONFIG");
    cmd
}

#[test]
fn tally_help() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("coin wallets, memberships and vouchers"));
}

#[test]
fn data_dir_flag_beats_environment() {
    let dir = TempDir::new().unwrap();
    let elsewhere = dir.path().join("elsewhere");
    tally(&dir)
        .args(["--data-dir", elsewhere.to_str().unwrap(), "account", "create", "Ada"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Created account acct_"));

    assert!(elsewhere.join("wal.jsonl").is_file());
    assert!(!dir.path().join("data").exists());
}

#[test]
fn log_file_receives_notifications() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("tally.toml"),
        "log_file = \"logs/tally.log\"\nlog_filter = \"info\"\n",
    )
    .unwrap();

    let output = tally(&dir)
        .env_remove("RUST_LOG")
        .args(["account", "create", "Ada", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let account: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = account["id"].as_str().unwrap();

    tally(&dir)
        .env_remove("RUST_LOG")
        .args(["admin", "grant-coins", id, "5", "--reason", "hello"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    let log = std::fs::read_to_string(dir.path().join("logs/tally.log")).unwrap();
    assert!(log.contains("wallet:credited"), "{}", log);
}
