//! Shared fixtures for the CLI specs
//!
//! Every spec runs the real `tally` binary against its own temporary data
//! directory. Logging is silenced so stderr only carries user-facing errors.

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch ledger: a temp dir used as the working directory and data dir
pub struct Ledger {
    dir: TempDir,
}

impl Ledger {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir().join("wal.jsonl")
    }

    /// Write a file relative to the ledger root
    pub fn file(&self, name: &str, content: &str) {
        std::fs::write(self.path().join(name), content).unwrap();
    }

    pub fn tally(&self) -> CliBuilder {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("tally").unwrap();
        cmd.current_dir(self.path())
            .env("TALLY_DATA_DIR", self.data_dir())
            .env("RUST_LOG", "off")
            .env_remove("TALLY_CONFIG");
        CliBuilder { cmd }
    }

    /// Run a command with `--format json` and parse stdout
    pub fn json(&self, args: &[&str]) -> Value {
        let mut full = args.to_vec();
        full.extend(["--format", "json"]);
        self.tally().args(&full).passes().json()
    }

    pub fn account(&self, name: &str) -> String {
        id_of(&self.json(&["account", "create", name]))
    }

    pub fn coin_package(&self, coins: u64, price: &str) -> String {
        let coins = coins.to_string();
        id_of(&self.json(&[
            "package", "add-coins", "Coins", "--coins", &coins, "--price", price,
        ]))
    }

    pub fn premium_package(&self, days: u32, price: &str) -> String {
        let days = days.to_string();
        id_of(&self.json(&[
            "package",
            "add-membership",
            "Premium",
            "--days",
            &days,
            "--price",
            price,
        ]))
    }

    pub fn grant(&self, account: &str, coins: u64) {
        let coins = coins.to_string();
        self.tally()
            .args(&["admin", "grant-coins", account, &coins, "--reason", "seed"])
            .passes();
    }

    pub fn balance(&self, account: &str) -> u64 {
        self.json(&["account", "show", account])["coin_balance"]
            .as_u64()
            .unwrap()
    }

    /// Create and confirm a purchase, returning its id
    pub fn buy(&self, account: &str, package: &str, voucher: Option<&str>) -> String {
        let mut args = vec!["purchase", "create", "--account", account, "--package", package];
        if let Some(code) = voucher {
            args.extend(["--voucher", code]);
        }
        let id = id_of(&self.json(&args));
        self.tally()
            .args(&["purchase", "confirm", &id, "--ref", "gw-1"])
            .passes();
        id
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert(self.cmd.assert().failure())
    }
}

pub struct RunAssert(Assert);

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stderr).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain {:?}:\n{}",
            expected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain {:?}:\n{}",
            expected,
            stderr
        );
        self
    }

    pub fn code(self, expected: i32) -> Self {
        let output = self.0.get_output();
        assert_eq!(output.status.code(), Some(expected));
        self
    }
}
