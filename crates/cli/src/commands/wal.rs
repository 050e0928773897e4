// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL maintenance
//!
//! `validate` and `repair` read the files directly and must not run while
//! another process has the store open.

use crate::config::Config;
use crate::error::TallyError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_storage::WalStore;

#[derive(Args)]
pub struct WalArgs {
    #[command(subcommand)]
    pub command: WalCommand,
}

#[derive(Subcommand)]
pub enum WalCommand {
    /// Check every entry's checksum; fails on corruption
    Validate,
    /// Truncate the WAL at the first corrupt entry
    Repair,
    /// Snapshot the current state now
    Snapshot {
        /// Also drop WAL entries covered by the snapshot
        #[arg(long)]
        compact: bool,
    },
}

#[derive(Serialize)]
struct ValidationInfo {
    valid_entries: u64,
    last_valid_sequence: Option<u64>,
}

impl fmt::Display for ValidationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WAL OK: {} entries", self.valid_entries)?;
        if let Some(sequence) = self.last_valid_sequence {
            write!(f, " (last sequence {})", sequence)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct RepairInfo {
    bytes_removed: u64,
}

impl fmt::Display for RepairInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes_removed {
            0 => write!(f, "WAL is clean; nothing to repair"),
            n => write!(f, "Removed {} bytes after the last valid entry", n),
        }
    }
}

#[derive(Serialize)]
struct SnapshotInfo {
    id: String,
    sequence: u64,
    size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries_removed: Option<usize>,
}

impl fmt::Display for SnapshotInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snapshot {} at sequence {} ({} bytes)",
            self.id, self.sequence, self.size_bytes
        )?;
        if let Some(removed) = self.entries_removed {
            write!(f, "; compacted {} entries", removed)?;
        }
        Ok(())
    }
}

pub fn handle(command: WalCommand, config: &Config, format: OutputFormat) -> Result<()> {
    let dir = &config.data_dir;
    match command {
        WalCommand::Validate => {
            let validation = WalStore::validate_wal(dir)?;
            if let Some(corruption) = validation.corruption {
                return Err(TallyError::wal_corruption(corruption.line, &corruption.reason)
                    .with_context(format!("{} valid entries precede it", validation.valid_entries))
                    .into());
            }
            let info = ValidationInfo {
                valid_entries: validation.valid_entries,
                last_valid_sequence: validation.last_valid_sequence,
            };
            output::print(&info, format);
        }
        WalCommand::Repair => {
            let bytes_removed = WalStore::repair_wal(dir)?;
            output::print(&RepairInfo { bytes_removed }, format);
        }
        WalCommand::Snapshot { compact } => {
            let mut store = WalStore::open(dir, config.store_config())?;
            let meta = store.create_snapshot()?;
            let entries_removed = if compact {
                Some(store.compact()?.entries_removed)
            } else {
                None
            };
            let info = SnapshotInfo {
                id: meta.id,
                sequence: meta.sequence,
                size_bytes: meta.size_bytes,
                entries_removed,
            };
            output::print(&info, format);
        }
    }
    Ok(())
}
