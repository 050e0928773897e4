// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ledger's durable store
//!
//! State lives in memory as a [`MaterializedState`]; the WAL is the record
//! of truth and snapshots only shorten the replay. Several processes may
//! open the same directory: each commit runs under the directory lock and
//! first replays whatever the others appended since this store last looked.

use crate::lock::{DirLock, LOCK_FILE};
use crate::operation::Operation;
use crate::reader::{WalReadError, WalReader, WalValidation};
use crate::snapshot::{SnapshotError, SnapshotManager, SnapshotMeta};
use crate::state::{ApplyError, MaterializedState};
use crate::writer::WalWriter;
use crate::StorageError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

pub const WAL_FILE: &str = "wal.jsonl";
pub const SNAPSHOTS_DIR: &str = "snapshots";

#[derive(Debug, Error)]
pub enum WalStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAL read error: {0}")]
    WalRead(#[from] WalReadError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("refusing to commit an empty batch")]
    EmptyBatch,
}

#[derive(Debug, Clone)]
pub struct WalStoreConfig {
    /// Commits between automatic snapshots
    pub snapshot_interval: u64,
    /// Snapshots kept behind the newest when the WAL is compacted
    pub keep_old_snapshots: usize,
    /// How many snapshot-covered entries the WAL may hold before compaction
    pub compaction_threshold: u64,
    /// Written into every WAL entry to tell writers apart
    pub machine_id: String,
}

impl Default for WalStoreConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 1000,
            keep_old_snapshots: 2,
            compaction_threshold: 10_000,
            machine_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// What a compaction removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionResult {
    pub entries_removed: usize,
    pub entries_kept: usize,
    pub bytes_reclaimed: u64,
}

/// Size and mtime of the WAL as this store last saw it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WalStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl WalStamp {
    fn read(path: &Path) -> Self {
        std::fs::metadata(path)
            .map(|meta| Self {
                len: meta.len(),
                modified: meta.modified().ok(),
            })
            .unwrap_or_default()
    }
}

pub struct WalStore {
    config: WalStoreConfig,
    base_dir: PathBuf,
    wal_path: PathBuf,
    lock_path: PathBuf,
    writer: WalWriter,
    snapshots: SnapshotManager,
    state: MaterializedState,
    last_snapshot_sequence: Option<u64>,
    commits_since_snapshot: u64,
    stamp: WalStamp,
}

impl WalStore {
    /// Open the store in `base_dir`, creating the directory if needed.
    ///
    /// State is rebuilt from the newest readable snapshot plus the WAL
    /// entries after it. A torn or corrupt entry ends the replay but is left
    /// on disk for [`repair_wal`](Self::repair_wal) to deal with.
    pub fn open(base_dir: &Path, config: WalStoreConfig) -> Result<Self, WalStoreError> {
        std::fs::create_dir_all(base_dir)?;
        let _lock = DirLock::shared(&base_dir.join(LOCK_FILE))?;
        Self::load(base_dir, config)
    }

    pub fn open_default(base_dir: &Path) -> Result<Self, WalStoreError> {
        Self::open(base_dir, WalStoreConfig::default())
    }

    fn load(base_dir: &Path, config: WalStoreConfig) -> Result<Self, WalStoreError> {
        let wal_path = base_dir.join(WAL_FILE);
        let snapshots = SnapshotManager::new(&base_dir.join(SNAPSHOTS_DIR));
        let mut state = MaterializedState::new();
        let mut last_snapshot_sequence = None;

        match snapshots.latest_snapshot() {
            Ok(Some(meta)) => match snapshots.load_snapshot(&meta.id) {
                Ok(storable) => {
                    state = storable.to_materialized();
                    last_snapshot_sequence = Some(storable.sequence_at_snapshot);
                }
                Err(e) => tracing::warn!(snapshot = %meta.id, error = %e, "ignoring unreadable snapshot"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to list snapshots"),
        }

        let start_sequence = last_snapshot_sequence.map(|s| s + 1).unwrap_or(0);
        let mut replayed = 0u64;
        for entry_result in WalReader::open_or_empty(&wal_path).entries_from(start_sequence)? {
            match entry_result {
                Ok(entry) => {
                    // Only a hand-edited WAL holds a batch that fails here
                    if let Err(e) = state.apply_batch(&entry.batch) {
                        tracing::warn!(sequence = entry.sequence, error = %e, "skipping batch on replay");
                    }
                    replayed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "replay stopped at a damaged WAL entry; run repair to drop the tail"
                    );
                    break;
                }
            }
        }

        let mut writer = WalWriter::open(&wal_path, &config.machine_id)?;
        writer.resume_from(start_sequence);

        tracing::debug!(
            path = %base_dir.display(),
            snapshot = ?last_snapshot_sequence,
            replayed,
            "store opened"
        );

        Ok(Self {
            config,
            base_dir: base_dir.to_path_buf(),
            lock_path: base_dir.join(LOCK_FILE),
            stamp: WalStamp::read(&wal_path),
            wal_path,
            writer,
            snapshots,
            state,
            last_snapshot_sequence,
            commits_since_snapshot: replayed,
        })
    }

    /// Check the WAL in `base_dir` for damage without loading any state
    pub fn validate_wal(base_dir: &Path) -> Result<WalValidation, WalStoreError> {
        let _lock = if base_dir.exists() {
            Some(DirLock::shared(&base_dir.join(LOCK_FILE))?)
        } else {
            None
        };
        Ok(WalReader::open_or_empty(&base_dir.join(WAL_FILE)).validate()?)
    }

    /// Cut the WAL back to the end of its last intact entry.
    ///
    /// Meant for crash recovery; stores already open on the directory keep
    /// whatever they replayed. Returns how many bytes were dropped.
    pub fn repair_wal(base_dir: &Path) -> Result<u64, WalStoreError> {
        let wal_path = base_dir.join(WAL_FILE);
        if !wal_path.exists() {
            return Ok(0);
        }
        let _lock = DirLock::exclusive(&base_dir.join(LOCK_FILE))?;

        let mut iter = WalReader::open_or_empty(&wal_path).entries()?;
        let mut last_valid_position = 0u64;
        let mut had_corruption = false;

        while let Some(entry_result) = iter.next() {
            match entry_result {
                Ok(_) => last_valid_position = iter.last_valid_position(),
                Err(e) => {
                    tracing::warn!(error = %e, "damaged WAL entry found during repair");
                    had_corruption = true;
                    break;
                }
            }
        }

        if !had_corruption {
            return Ok(0);
        }

        let old_size = std::fs::metadata(&wal_path)?.len();
        if last_valid_position >= old_size {
            return Ok(0);
        }

        let file = std::fs::OpenOptions::new().write(true).open(&wal_path)?;
        file.set_len(last_valid_position)?;
        file.sync_all()?;
        tracing::info!(position = last_valid_position, "WAL cut back to its last intact entry");

        Ok(old_size - last_valid_position)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Sequence the next commit will get
    pub fn sequence(&self) -> u64 {
        self.writer.sequence()
    }

    pub fn last_snapshot_sequence(&self) -> Option<u64> {
        self.last_snapshot_sequence
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    /// Whether the WAL changed since this store last read or wrote it
    pub fn is_stale(&self) -> bool {
        WalStamp::read(&self.wal_path) != self.stamp
    }

    /// Replay batches other processes committed since this store last looked
    pub fn refresh(&mut self) -> Result<(), WalStoreError> {
        if !self.is_stale() {
            return Ok(());
        }
        let _lock = DirLock::shared(&self.lock_path)?;
        self.catch_up()
    }

    /// Apply a batch and write it to the WAL as one entry.
    ///
    /// The batch is checked against the latest state on disk, so a batch
    /// planned from a view another process has since moved past fails with a
    /// version conflict. Nothing is kept if any operation is rejected or the
    /// write fails.
    pub fn commit(&mut self, batch: Vec<Operation>) -> Result<u64, WalStoreError> {
        if batch.is_empty() {
            return Err(WalStoreError::EmptyBatch);
        }
        let _lock = DirLock::exclusive(&self.lock_path)?;
        self.catch_up()?;

        let undo = self.state.apply_batch(&batch)?;
        let ops = batch.len();
        match self.writer.append(batch) {
            Ok(sequence) => {
                self.commits_since_snapshot += 1;
                self.stamp = WalStamp::read(&self.wal_path);
                tracing::trace!(sequence, ops, "batch committed");
                Ok(sequence)
            }
            Err(e) => {
                self.state.rollback(undo);
                tracing::error!(error = %e, "WAL append failed; batch rolled back");
                Err(e.into())
            }
        }
    }

    /// Bring the in-memory state up to the end of the WAL. The caller holds
    /// the directory lock.
    fn catch_up(&mut self) -> Result<(), WalStoreError> {
        if !self.is_stale() {
            return Ok(());
        }

        let mut next = self.writer.sequence();
        let mut applied = 0u64;
        for entry_result in WalReader::open_or_empty(&self.wal_path).entries_from(next)? {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "catch-up stopped at a damaged WAL entry");
                    break;
                }
            };
            if entry.sequence != next {
                // Another process compacted away entries this store never saw
                tracing::debug!(expected = next, found = entry.sequence, "reloading after foreign compaction");
                return self.reload();
            }
            if let Err(e) = self.state.apply_batch(&entry.batch) {
                tracing::warn!(sequence = entry.sequence, error = %e, "skipping batch on catch-up");
            }
            if let [Operation::SnapshotTaken { .. }] = entry.batch.as_slice() {
                self.last_snapshot_sequence = Some(entry.sequence.saturating_sub(1));
                self.commits_since_snapshot = 0;
            } else {
                self.commits_since_snapshot += 1;
            }
            next += 1;
            applied += 1;
        }

        // A foreign compaction swaps the file, so the old handle may be stale
        self.writer = WalWriter::open(&self.wal_path, &self.config.machine_id)?;
        self.writer.resume_from(next);
        self.stamp = WalStamp::read(&self.wal_path);
        if applied > 0 {
            tracing::debug!(applied, sequence = next, "caught up with other writers");
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<(), WalStoreError> {
        let base_dir = self.base_dir.clone();
        *self = Self::load(&base_dir, self.config.clone())?;
        Ok(())
    }

    // === Snapshots ===

    /// Write a snapshot of the current state and mark it in the WAL
    pub fn create_snapshot(&mut self) -> Result<SnapshotMeta, WalStoreError> {
        let _lock = DirLock::exclusive(&self.lock_path)?;
        self.catch_up()?;

        let sequence = self.writer.last_sequence().unwrap_or(0);
        let meta = self.snapshots.create_snapshot(&self.state, sequence)?;

        self.writer.append(vec![Operation::SnapshotTaken {
            snapshot_id: meta.id.clone(),
        }])?;
        self.stamp = WalStamp::read(&self.wal_path);

        self.last_snapshot_sequence = Some(sequence);
        self.commits_since_snapshot = 0;
        tracing::info!(snapshot = %meta.id, sequence, "snapshot created");

        Ok(meta)
    }

    /// Snapshot once `snapshot_interval` commits have piled up
    pub fn maybe_snapshot(&mut self) -> Result<Option<SnapshotMeta>, WalStoreError> {
        if self.commits_since_snapshot >= self.config.snapshot_interval {
            Ok(Some(self.create_snapshot()?))
        } else {
            Ok(None)
        }
    }

    /// Drop WAL entries the last snapshot already covers.
    ///
    /// The surviving tail is written to a side file and renamed over the
    /// WAL, so a crash mid-way leaves the old file intact.
    pub fn compact(&mut self) -> Result<CompactionResult, WalStoreError> {
        let _lock = DirLock::exclusive(&self.lock_path)?;
        self.catch_up()?;

        let Some(snapshot_seq) = self.last_snapshot_sequence else {
            return Ok(CompactionResult {
                entries_removed: 0,
                entries_kept: 0,
                bytes_reclaimed: 0,
            });
        };

        let old_size = std::fs::metadata(&self.wal_path)
            .map(|m| m.len())
            .unwrap_or(0);

        let (kept, removed): (Vec<_>, Vec<_>) = WalReader::open_or_empty(&self.wal_path)
            .entries()?
            .map_while(Result::ok)
            .partition(|entry| entry.sequence > snapshot_seq);

        if removed.is_empty() {
            return Ok(CompactionResult {
                entries_removed: 0,
                entries_kept: kept.len(),
                bytes_reclaimed: 0,
            });
        }

        let temp_path = self.wal_path.with_extension("jsonl.compact.tmp");
        {
            use std::io::Write;
            let mut file = std::fs::File::create(&temp_path)?;
            for entry in &kept {
                let line = entry.to_line()?;
                file.write_all(line.as_bytes())?;
                file.write_all(b"\n")?;
            }
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.wal_path)?;

        let next_sequence = self.writer.sequence();
        self.writer = WalWriter::open(&self.wal_path, &self.config.machine_id)?;
        self.writer.resume_from(next_sequence);
        self.stamp = WalStamp::read(&self.wal_path);

        let bytes_reclaimed = old_size.saturating_sub(self.stamp.len);

        self.snapshots
            .cleanup_old_snapshots(snapshot_seq, self.config.keep_old_snapshots)?;

        tracing::info!(
            entries_removed = removed.len(),
            entries_kept = kept.len(),
            bytes_reclaimed,
            "WAL compacted"
        );

        Ok(CompactionResult {
            entries_removed: removed.len(),
            entries_kept: kept.len(),
            bytes_reclaimed,
        })
    }

    /// Whether more than `compaction_threshold` snapshot-covered entries
    /// are still in the WAL
    pub fn should_compact(&self) -> bool {
        let Some(snapshot_seq) = self.last_snapshot_sequence else {
            return false;
        };
        let first = WalReader::open_or_empty(&self.wal_path)
            .entries()
            .ok()
            .and_then(|mut entries| entries.next())
            .and_then(Result::ok)
            .map(|entry| entry.sequence)
            .unwrap_or(snapshot_seq);
        snapshot_seq.saturating_sub(first) > self.config.compaction_threshold
    }

    pub fn maybe_compact(&mut self) -> Result<Option<CompactionResult>, WalStoreError> {
        if self.should_compact() {
            Ok(Some(self.compact()?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
