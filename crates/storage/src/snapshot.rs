// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger snapshots
//!
//! A snapshot is the whole materialized state as JSON, named after the last
//! WAL sequence it includes. Opening a store starts from the newest one, and
//! compaction may drop every WAL entry at or below its sequence.

use crate::state::MaterializedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tally_core::{
    Account, AccountId, ItemRef, LedgerEntry, Package, Purchase, Voucher, VoucherUsage,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot not found: {0}")]
    NotFound(String),
    #[error("invalid snapshot format: {0}")]
    InvalidFormat(String),
}

/// On-disk form of [`MaterializedState`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorableState {
    pub version: u32,
    pub sequence_at_snapshot: u64,
    pub timestamp: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub packages: Vec<Package>,
    pub vouchers: Vec<Voucher>,
    pub purchases: Vec<Purchase>,
    /// In commit order
    pub ledger: Vec<LedgerEntry>,
    pub voucher_usages: Vec<VoucherUsage>,
    #[serde(default)]
    pub unlocks: Vec<StorableUnlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorableUnlock {
    pub account: AccountId,
    pub item: ItemRef,
}

impl StorableState {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn from_materialized(state: &MaterializedState, sequence: u64) -> Self {
        let mut purchases: Vec<Purchase> = state.all_purchases().cloned().collect();
        purchases.sort_by(|a, b| a.id.cmp(&b.id));
        let mut unlocks: Vec<StorableUnlock> = state
            .all_unlocks()
            .map(|(account, item)| StorableUnlock {
                account: account.clone(),
                item: item.clone(),
            })
            .collect();
        unlocks.sort_by(|a, b| (&a.account, &a.item).cmp(&(&b.account, &b.item)));

        Self {
            version: Self::CURRENT_VERSION,
            sequence_at_snapshot: sequence,
            timestamp: Utc::now(),
            accounts: state.accounts().into_iter().cloned().collect(),
            packages: state.packages().into_iter().cloned().collect(),
            vouchers: state.vouchers().into_iter().cloned().collect(),
            purchases,
            ledger: state.ledger().to_vec(),
            voucher_usages: state.voucher_usages().to_vec(),
            unlocks,
        }
    }

    pub fn to_materialized(&self) -> MaterializedState {
        MaterializedState::from_parts(
            self.accounts.clone(),
            self.packages.clone(),
            self.vouchers.clone(),
            self.purchases.clone(),
            self.ledger.clone(),
            self.voucher_usages.clone(),
            self.unlocks
                .iter()
                .map(|u| (u.account.clone(), u.item.clone()))
                .collect(),
        )
    }
}

/// What a listing knows about a snapshot without opening it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub size_bytes: u64,
}

/// The snapshot directory
pub struct SnapshotManager {
    snapshots_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new(snapshots_dir: &Path) -> Self {
        Self {
            snapshots_dir: snapshots_dir.to_path_buf(),
        }
    }

    pub fn ensure_dir(&self) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.snapshots_dir)?;
        Ok(())
    }

    /// `<sequence, zero-padded>-<UTC time>`, so names sort by sequence
    pub fn generate_id(sequence: u64, timestamp: DateTime<Utc>) -> String {
        format!("{:08}-{}", sequence, timestamp.format("%Y%m%d%H%M%S"))
    }

    /// Save `state` as of WAL entry `sequence`.
    ///
    /// Readers only ever see complete files: the JSON is synced under a
    /// `.tmp` name first and then renamed.
    pub fn create_snapshot(
        &self,
        state: &MaterializedState,
        sequence: u64,
    ) -> Result<SnapshotMeta, SnapshotError> {
        self.ensure_dir()?;

        let storable = StorableState::from_materialized(state, sequence);
        let id = Self::generate_id(sequence, storable.timestamp);

        let path = self.snapshot_path(&id);
        let temp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            serde_json::to_writer_pretty(&mut writer, &storable)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        let size_bytes = fs::metadata(&path)?.len();

        Ok(SnapshotMeta {
            id,
            sequence,
            timestamp: storable.timestamp,
            size_bytes,
        })
    }

    pub fn load_snapshot(&self, id: &str) -> Result<StorableState, SnapshotError> {
        let path = self.snapshot_path(id);
        if !path.exists() {
            return Err(SnapshotError::NotFound(id.to_string()));
        }

        let reader = BufReader::new(File::open(&path)?);
        let state: StorableState = serde_json::from_reader(reader)?;

        if state.version != StorableState::CURRENT_VERSION {
            return Err(SnapshotError::InvalidFormat(format!(
                "unsupported version: {} (expected {})",
                state.version,
                StorableState::CURRENT_VERSION
            )));
        }

        Ok(state)
    }

    /// Snapshots on disk by descending sequence; stray files are ignored
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        if !self.snapshots_dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();

        for entry in fs::read_dir(&self.snapshots_dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(sequence) = stem
                .split_once('-')
                .and_then(|(seq, _)| seq.parse::<u64>().ok())
            else {
                continue;
            };
            let metadata = fs::metadata(&path)?;
            snapshots.push(SnapshotMeta {
                id: stem.to_string(),
                sequence,
                timestamp: DateTime::from(metadata.modified()?),
                size_bytes: metadata.len(),
            });
        }

        snapshots.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        Ok(snapshots)
    }

    pub fn latest_snapshot(&self) -> Result<Option<SnapshotMeta>, SnapshotError> {
        Ok(self.list_snapshots()?.into_iter().next())
    }

    pub fn delete_snapshot(&self, id: &str) -> Result<(), SnapshotError> {
        let path = self.snapshot_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Remove snapshots below `keep_sequence` except the `keep_count` most
    /// recent of them; returns the removed ids
    pub fn cleanup_old_snapshots(
        &self,
        keep_sequence: u64,
        keep_count: usize,
    ) -> Result<Vec<String>, SnapshotError> {
        let mut deleted = Vec::new();

        let older = self
            .list_snapshots()?
            .into_iter()
            .filter(|s| s.sequence < keep_sequence)
            .skip(keep_count);
        for snapshot in older {
            self.delete_snapshot(&snapshot.id)?;
            deleted.push(snapshot.id);
        }

        Ok(deleted)
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        self.snapshots_dir.join(format!("{}.json", id))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
