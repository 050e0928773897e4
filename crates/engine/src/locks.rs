// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed in-process mutexes
//!
//! Requests touching the same account (or voucher) queue on one mutex while
//! unrelated keys proceed in parallel. Callers take the account lock before
//! any voucher lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Entries beyond this count trigger a sweep of idle keys
const PRUNE_THRESHOLD: usize = 1024;

pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The mutex for `key`; lock the returned handle for the critical section
    pub fn handle(&self, key: &K) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.len() > PRUNE_THRESHOLD {
            // Only the map holds idle handles
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
