// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL entry structure with checksum verification
//!
//! Each WAL entry contains a sequence number, timestamp, machine ID,
//! the batch of operations committed together, and a CRC32 checksum.

use crate::operation::Operation;
use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single entry in the write-ahead log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    /// Microseconds since Unix epoch
    pub timestamp_micros: u64,
    /// Identifier of the process that wrote the entry
    pub machine_id: String,
    /// Operations committed atomically
    pub batch: Vec<Operation>,
    /// CRC32 checksum of the serialized batch
    pub checksum: u32,
}

impl WalEntry {
    /// Create a new WAL entry with computed checksum
    pub fn new(sequence: u64, machine_id: &str, batch: Vec<Operation>) -> Self {
        let timestamp_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Self::new_with_timestamp(sequence, timestamp_micros, machine_id, batch)
    }

    /// Create a new WAL entry with a specific timestamp (for testing)
    pub fn new_with_timestamp(
        sequence: u64,
        timestamp_micros: u64,
        machine_id: &str,
        batch: Vec<Operation>,
    ) -> Self {
        let checksum = Self::calculate_checksum(&batch);
        Self {
            sequence,
            timestamp_micros,
            machine_id: machine_id.to_string(),
            batch,
            checksum,
        }
    }

    fn calculate_checksum(batch: &[Operation]) -> u32 {
        // Operations are plain data; serialization cannot fail
        let json = serde_json::to_string(batch).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    /// Verify the checksum matches the batch
    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.batch)
    }

    /// Serialize to newline-delimited JSON (one line)
    pub fn to_line(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(StorageError::from)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, StorageError> {
        serde_json::from_str(line).map_err(StorageError::from)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
