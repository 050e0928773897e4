// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tally-storage: write-ahead log persistence for the ledger
//!
//! ## Architecture
//!
//! ```text
//! Vec<Operation> → WalEntry → WalWriter → disk (wal.jsonl)
//!                                              ↓
//!                                    WalReader → replay → MaterializedState
//! ```
//!
//! ## Guarantees
//!
//! - A WAL entry holds one batch, and a batch lands whole or not at all
//! - `append` returns only after the entry is fsync'd
//! - Each entry carries a CRC32, so flipped bits and torn tails are caught on read
//! - Repair cuts the file back to the last intact entry
//! - Commits from several processes on one directory are serialized by `wal.lock`

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod entry;
mod lock;
pub mod operation;
pub mod reader;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod writer;

#[cfg(test)]
mod fixtures;

pub use entry::WalEntry;
pub use lock::LOCK_FILE;
pub use operation::*;
pub use reader::{WalCorruption, WalEntryIter, WalReadError, WalReader, WalValidation};
pub use snapshot::{SnapshotError, SnapshotManager, SnapshotMeta, StorableState};
pub use state::{ApplyError, MaterializedState, UndoLog};
pub use store::{CompactionResult, WalStore, WalStoreConfig, WalStoreError};
pub use writer::WalWriter;

use thiserror::Error;

/// Low-level errors from encoding or writing WAL lines
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
