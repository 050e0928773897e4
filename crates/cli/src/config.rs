// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tally.toml` loading
//!
//! Every key is optional. Resolution order for the file itself is
//! `--config`, then `TALLY_CONFIG`, then `./tally.toml` when present.
//! `TALLY_DATA_DIR` overrides `data_dir` from the file, and `--data-dir`
//! overrides both.

use crate::error::TallyError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tally_engine::EngineConfig;
use tally_storage::WalStoreConfig;

pub const CONFIG_FILE: &str = "tally.toml";
pub const CONFIG_ENV: &str = "TALLY_CONFIG";
pub const DATA_DIR_ENV: &str = "TALLY_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the WAL and snapshots
    pub data_dir: PathBuf,
    /// Written into every WAL entry; a random id per process when unset
    pub machine_id: Option<String>,
    pub snapshot_interval: u64,
    pub keep_old_snapshots: usize,
    pub compaction_threshold: u64,
    pub conflict_retries: u32,
    pub auto_snapshot: bool,
    /// Log to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        let store = WalStoreConfig::default();
        let engine = EngineConfig::default();
        Self {
            data_dir: PathBuf::from(".tally"),
            machine_id: None,
            snapshot_interval: store.snapshot_interval,
            keep_old_snapshots: store.keep_old_snapshots,
            compaction_threshold: store.compaction_threshold,
            conflict_retries: engine.conflict_retries,
            auto_snapshot: engine.auto_snapshot,
            log_file: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load using the process environment
    pub fn load(explicit: Option<&Path>) -> Result<Self, TallyError> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Load with `env` standing in for the process environment
    pub fn load_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TallyError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env(CONFIG_ENV).map(PathBuf::from).or_else(|| {
                let local = PathBuf::from(CONFIG_FILE);
                local.is_file().then_some(local)
            }),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(dir) = env(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, TallyError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TallyError::config_invalid(path, &e).with_source(e))?;
        Self::parse(&text).map_err(|e| TallyError::config_invalid(path, &e).with_source(e))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn store_config(&self) -> WalStoreConfig {
        let defaults = WalStoreConfig::default();
        WalStoreConfig {
            snapshot_interval: self.snapshot_interval,
            keep_old_snapshots: self.keep_old_snapshots,
            compaction_threshold: self.compaction_threshold,
            machine_id: self.machine_id.clone().unwrap_or(defaults.machine_id),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            conflict_retries: self.conflict_retries,
            auto_snapshot: self.auto_snapshot,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
