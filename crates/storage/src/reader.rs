// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reading the WAL back
//!
//! Lines are parsed and checksummed one at a time. The first line that
//! fails either check ends the readable log: callers stop there, and repair
//! cuts the file at the byte offset where it starts.

use crate::entry::WalEntry;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalReadError {
    #[error("corrupted entry at line {line}: {reason}")]
    Corrupted { line: u64, reason: String },
    #[error("checksum mismatch at line {line}")]
    ChecksumMismatch { line: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct WalReader {
    path: PathBuf,
}

impl WalReader {
    /// Reader over an existing WAL file
    pub fn open(path: &Path) -> Result<Self, WalReadError> {
        if !path.exists() {
            return Err(WalReadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no WAL at {}", path.display()),
            )));
        }
        Ok(Self::open_or_empty(path))
    }

    /// Reader that yields nothing if the file is missing
    pub fn open_or_empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn entries(&self) -> Result<WalEntryIter, WalReadError> {
        self.entries_from(0)
    }

    /// Entries with a sequence of at least `sequence`
    pub fn entries_from(&self, sequence: u64) -> Result<WalEntryIter, WalReadError> {
        let lines = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(WalEntryIter {
            lines,
            from: sequence,
            line: 0,
            offset: 0,
            good_end: 0,
        })
    }

    pub fn last_sequence(&self) -> Result<Option<u64>, WalReadError> {
        Ok(self.intact()?.last().map(|entry| entry.sequence))
    }

    pub fn count(&self) -> Result<u64, WalReadError> {
        Ok(self.intact()?.count() as u64)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count the intact entries and locate the first damaged line
    pub fn validate(&self) -> Result<WalValidation, WalReadError> {
        let mut validation = WalValidation {
            valid_entries: 0,
            last_valid_sequence: None,
            corruption: None,
        };

        for result in self.entries()? {
            match result {
                Ok(entry) => {
                    validation.valid_entries += 1;
                    validation.last_valid_sequence = Some(entry.sequence);
                }
                Err(e) => {
                    let line = match &e {
                        WalReadError::Corrupted { line, .. }
                        | WalReadError::ChecksumMismatch { line } => *line,
                        WalReadError::Io(_) => validation.valid_entries + 1,
                    };
                    let reason = match e {
                        WalReadError::Corrupted { reason, .. } => reason,
                        WalReadError::ChecksumMismatch { .. } => "checksum mismatch".to_string(),
                        WalReadError::Io(e) => format!("IO error: {}", e),
                    };
                    validation.corruption = Some(WalCorruption { line, reason });
                    break;
                }
            }
        }

        Ok(validation)
    }

    fn intact(&self) -> Result<impl Iterator<Item = WalEntry>, WalReadError> {
        Ok(self.entries()?.map_while(Result::ok))
    }
}

/// Entries in file order, tracking where the intact prefix ends
pub struct WalEntryIter {
    lines: Option<BufReader<File>>,
    from: u64,
    /// 1-based number of the line read last
    line: u64,
    /// Bytes consumed so far
    offset: u64,
    /// Offset just past the last entry that parsed and verified
    good_end: u64,
}

impl WalEntryIter {
    /// Where repair truncates: the end of the last intact entry
    pub fn last_valid_position(&self) -> u64 {
        self.good_end
    }
}

impl Iterator for WalEntryIter {
    type Item = Result<WalEntry, WalReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;
        let mut buf = String::new();

        loop {
            buf.clear();
            let read = match lines.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(read) => read as u64,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            self.offset += read;

            let text = buf.trim();
            if text.is_empty() {
                continue;
            }
            let entry = match WalEntry::from_line(text) {
                Ok(entry) => entry,
                Err(e) => {
                    return Some(Err(WalReadError::Corrupted {
                        line: self.line,
                        reason: e.to_string(),
                    }))
                }
            };
            if !entry.verify() {
                return Some(Err(WalReadError::ChecksumMismatch { line: self.line }));
            }

            self.good_end = self.offset;
            if entry.sequence >= self.from {
                return Some(Ok(entry));
            }
        }
    }
}

#[derive(Debug)]
pub struct WalValidation {
    pub valid_entries: u64,
    pub last_valid_sequence: Option<u64>,
    pub corruption: Option<WalCorruption>,
}

/// First damaged line of a WAL
#[derive(Debug)]
pub struct WalCorruption {
    pub line: u64,
    pub reason: String,
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
