// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory lock on a data directory
//!
//! Every process that writes the WAL takes the exclusive lock for the length
//! of one commit; readers catching up take it shared. The lock is released
//! when the guard drops.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

pub const LOCK_FILE: &str = "wal.lock";

pub(crate) struct DirLock {
    file: File,
}

impl DirLock {
    /// Block until no other process is writing
    pub fn shared(path: &Path) -> io::Result<Self> {
        let file = Self::open(path)?;
        FileExt::lock_shared(&file)?;
        Ok(Self { file })
    }

    /// Block until this process is the only one holding the lock
    pub fn exclusive(path: &Path) -> io::Result<Self> {
        let file = Self::open(path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file })
    }

    fn open(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release data directory lock");
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
