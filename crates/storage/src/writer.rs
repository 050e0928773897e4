// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Appending to the WAL
//!
//! One line per batch. A sequence number is only consumed once its line is
//! synced to disk, so a failed append can be retried with the same number.

use crate::entry::WalEntry;
use crate::operation::Operation;
use crate::StorageError;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub struct WalWriter {
    path: PathBuf,
    file: File,
    next_sequence: u64,
    machine_id: String,
    bytes_written: u64,
}

impl WalWriter {
    /// Open `path` for appending, creating it and its directory if needed.
    ///
    /// An existing file is scanned so numbering continues after its last
    /// intact entry.
    pub fn open(path: &Path, machine_id: &str) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let next_sequence = if path.exists() {
            Self::scan_last_sequence(path)?.map(|s| s + 1).unwrap_or(0)
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_sequence,
            machine_id: machine_id.to_string(),
            bytes_written: 0,
        })
    }

    /// Sequence of the last entry before the first damaged line
    fn scan_last_sequence(path: &Path) -> Result<Option<u64>, StorageError> {
        let reader = BufReader::new(File::open(path)?);
        let mut last_sequence = None;

        for line_result in reader.lines() {
            let Ok(line) = line_result else { break };
            if line.trim().is_empty() {
                continue;
            }
            match WalEntry::from_line(&line) {
                Ok(entry) if entry.verify() => last_sequence = Some(entry.sequence),
                // Torn or tampered line
                _ => break,
            }
        }

        Ok(last_sequence)
    }

    /// Write `batch` as the next entry and return its sequence number once
    /// the line is on disk
    pub fn append(&mut self, batch: Vec<Operation>) -> Result<u64, StorageError> {
        let entry = WalEntry::new(self.next_sequence, &self.machine_id, batch);
        self.write_entry(&entry)
    }

    /// [`append`](Self::append) with a fixed timestamp, for deterministic files
    pub fn append_with_timestamp(
        &mut self,
        batch: Vec<Operation>,
        timestamp_micros: u64,
    ) -> Result<u64, StorageError> {
        let entry = WalEntry::new_with_timestamp(
            self.next_sequence,
            timestamp_micros,
            &self.machine_id,
            batch,
        );
        self.write_entry(&entry)
    }

    fn write_entry(&mut self, entry: &WalEntry) -> Result<u64, StorageError> {
        let line = entry.to_line()?;

        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.sync_all()?;

        self.next_sequence = entry.sequence + 1;
        self.bytes_written += line.len() as u64 + 1;
        Ok(entry.sequence)
    }

    /// Raise the next sequence to at least `next_sequence`.
    ///
    /// After compaction the file can start past zero or be empty, so the
    /// scan alone may number too low.
    pub fn resume_from(&mut self, next_sequence: u64) {
        self.next_sequence = self.next_sequence.max(next_sequence);
    }

    /// Sequence the next append will use
    pub fn sequence(&self) -> u64 {
        self.next_sequence
    }

    /// `None` until something has been written
    pub fn last_sequence(&self) -> Option<u64> {
        self.next_sequence.checked_sub(1)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
