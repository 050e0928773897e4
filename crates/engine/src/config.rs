// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning knobs

/// Engine configuration; storage knobs live in `WalStoreConfig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How many times a commit that lost an optimistic version race is
    /// re-planned before surfacing `ConcurrencyConflict`
    pub conflict_retries: u32,
    /// Snapshot and compact the store after commits when thresholds are met
    pub auto_snapshot: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 3,
            auto_snapshot: true,
        }
    }
}
