// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ledger engine
//!
//! Every mutating operation follows the same cycle:
//!
//! 1. take the per-account (then per-voucher) lock
//! 2. pick up commits other processes made to the same data directory
//! 3. plan the batch against a read view of the state
//! 4. commit the batch; the store re-validates versions and voucher limits
//! 5. on a version conflict, plan again (bounded by `conflict_retries`)
//! 6. deliver the planned events once the batch is durable

use crate::config::EngineConfig;
use crate::error::LedgerError;
use crate::locks::KeyedLocks;
use crate::notify::NotifyAdapter;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tally_core::{AccountId, Clock, Event, IdGen, VoucherCode};
use tally_storage::{
    ApplyError, MaterializedState, Operation, SnapshotMeta, WalStore, WalStoreConfig,
    WalStoreError,
};

/// Engine collaborators
pub struct EngineDeps<C, I, N> {
    pub clock: C,
    pub ids: I,
    pub notify: N,
}

/// A batch ready to commit, with the events it produces and the value
/// returned to the caller once it is durable
pub(crate) struct Plan<T> {
    pub ops: Vec<Operation>,
    pub events: Vec<Event>,
    pub output: T,
}

impl<T> Plan<T> {
    pub fn new(output: T) -> Self {
        Self {
            ops: Vec::new(),
            events: Vec::new(),
            output,
        }
    }

    pub fn op(mut self, op: Operation) -> Self {
        self.ops.push(op);
        self
    }

    pub fn event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }
}

/// Lock handles for one request; `hold` enters the critical section
pub(crate) struct LockSet {
    account: Arc<Mutex<()>>,
    voucher: Option<Arc<Mutex<()>>>,
}

/// Guards released on drop, voucher before account
pub(crate) struct Held<'a> {
    _voucher: Option<MutexGuard<'a, ()>>,
    _account: MutexGuard<'a, ()>,
}

impl LockSet {
    pub fn hold(&self) -> Held<'_> {
        let account = self.account.lock().unwrap_or_else(|e| e.into_inner());
        let voucher = self
            .voucher
            .as_ref()
            .map(|lock| lock.lock().unwrap_or_else(|e| e.into_inner()));
        Held {
            _voucher: voucher,
            _account: account,
        }
    }
}

pub struct Engine<C: Clock, I: IdGen, N: NotifyAdapter> {
    store: RwLock<WalStore>,
    account_locks: KeyedLocks<AccountId>,
    voucher_locks: KeyedLocks<VoucherCode>,
    clock: C,
    ids: I,
    notify: N,
    config: EngineConfig,
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    pub fn new(store: WalStore, deps: EngineDeps<C, I, N>, config: EngineConfig) -> Self {
        Self {
            store: RwLock::new(store),
            account_locks: KeyedLocks::new(),
            voucher_locks: KeyedLocks::new(),
            clock: deps.clock,
            ids: deps.ids,
            notify: deps.notify,
            config,
        }
    }

    /// Open (or create) the store in `data_dir` and wrap it in an engine
    pub fn open(
        data_dir: &Path,
        store_config: WalStoreConfig,
        deps: EngineDeps<C, I, N>,
        config: EngineConfig,
    ) -> Result<Self, LedgerError> {
        let store = WalStore::open(data_dir, store_config)?;
        Ok(Self::new(store, deps, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Next WAL sequence number
    pub fn sequence(&self) -> u64 {
        self.read_store().sequence()
    }

    /// Snapshot the state now, regardless of the configured interval
    pub fn snapshot(&self) -> Result<SnapshotMeta, LedgerError> {
        Ok(self.write_store().create_snapshot()?)
    }

    /// Run a read-only query against the current state.
    ///
    /// If catching up with other processes fails the query sees the state
    /// as this engine last knew it.
    pub fn read<T>(&self, query: impl FnOnce(&MaterializedState) -> T) -> T {
        if let Err(e) = self.refresh() {
            tracing::warn!(error = %e, "could not catch up with the WAL, reading cached state");
        }
        query(self.read_store().state())
    }

    pub(crate) fn ids(&self) -> &I {
        &self.ids
    }

    /// Locks for an account, and a voucher if one is involved
    pub(crate) fn locks(&self, account: &AccountId, voucher: Option<&VoucherCode>) -> LockSet {
        LockSet {
            account: self.account_locks.handle(account),
            voucher: voucher.map(|code| self.voucher_locks.handle(code)),
        }
    }

    /// Plan and commit a batch, re-planning after lost version races.
    ///
    /// A plan with no operations commits nothing and returns its output.
    pub(crate) fn execute<T>(
        &self,
        action: &'static str,
        mut plan: impl FnMut(&MaterializedState, DateTime<Utc>) -> Result<Plan<T>, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.refresh()?;
            let now = self.clock.now();
            let Plan {
                ops,
                events,
                output,
            } = plan(self.read_store().state(), now)?;
            if ops.is_empty() {
                return Ok(output);
            }

            match self.commit(ops) {
                Ok(sequence) => {
                    tracing::debug!(action, sequence, events = events.len(), "committed");
                    self.deliver(&events);
                    return Ok(output);
                }
                Err(WalStoreError::Apply(ApplyError::VersionConflict {
                    account,
                    expected,
                    actual,
                })) if attempt <= self.config.conflict_retries => {
                    tracing::debug!(action, %account, expected, actual, attempt, "version conflict, retrying");
                }
                Err(e) => {
                    let err = LedgerError::from_commit(e, attempt);
                    if err.is_integrity() {
                        tracing::error!(action, error = %err, "commit rejected");
                    } else {
                        tracing::info!(action, error = %err, "commit rejected");
                    }
                    return Err(err);
                }
            }
        }
    }

    fn commit(&self, ops: Vec<Operation>) -> Result<u64, WalStoreError> {
        let mut store = self.write_store();
        let sequence = store.commit(ops)?;
        if self.config.auto_snapshot {
            if let Err(e) = store.maybe_snapshot() {
                tracing::warn!(error = %e, "automatic snapshot failed");
            } else if let Err(e) = store.maybe_compact() {
                tracing::warn!(error = %e, "automatic compaction failed");
            }
        }
        Ok(sequence)
    }

    fn refresh(&self) -> Result<(), WalStoreError> {
        if !self.read_store().is_stale() {
            return Ok(());
        }
        self.write_store().refresh()
    }

    fn deliver(&self, events: &[Event]) {
        for event in events {
            if let Err(e) = self.notify.notify(event) {
                tracing::warn!(event = %event.name(), account = %event.account(), error = %e, "event delivery failed");
            }
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, WalStore> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, WalStore> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
