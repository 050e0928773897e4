// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger appends, status mirroring and audit queries

use crate::engine::{Engine, Plan};
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use tally_core::{Clock, IdGen, LedgerEntry, LedgerEntryId, LedgerQuery, Page, Status};
use tally_storage::{LedgerAppendOp, LedgerTransitionOp, Operation};

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    /// Fresh ledger entry id
    pub fn next_entry_id(&self) -> LedgerEntryId {
        LedgerEntryId::generate(self.ids())
    }

    /// Append an entry that moves no coins and grants nothing.
    ///
    /// Entries that do move coins or entitlements are appended by the
    /// operation that makes the change.
    pub fn append(&self, entry: LedgerEntry) -> Result<LedgerEntryId, LedgerError> {
        if entry.coins_received > 0 || entry.coins_spent > 0 || entry.membership.is_some() {
            return Err(LedgerError::invalid(
                "entries that move coins or memberships are written by wallet and entitlement operations",
            ));
        }
        self.execute("ledger_append", |state, _now| {
            lookup::account(state, &entry.account)?;
            Ok(Plan::new(entry.id.clone()).op(Operation::LedgerAppend(LedgerAppendOp {
                entry: entry.clone(),
            })))
        })
    }

    /// Move an entry along the settlement state machine.
    ///
    /// Entries produced by a purchase follow the purchase; use the purchase
    /// operations for those.
    pub fn transition_status(&self, id: &LedgerEntryId, to: Status) -> Result<(), LedgerError> {
        self.execute("ledger_transition", |state, now| {
            let entry = state
                .ledger_entry(id)
                .ok_or_else(|| LedgerError::not_found("ledger entry", id))?;
            if let Some(purchase) = &entry.purchase {
                return Err(LedgerError::invalid(format!(
                    "ledger entry {} mirrors purchase {}",
                    id, purchase
                )));
            }
            entry
                .status
                .transition(to)
                .map_err(|e| LedgerError::InvalidStateTransition {
                    kind: "ledger entry",
                    id: id.to_string(),
                    from: e.from,
                    to: e.to,
                })?;
            Ok(Plan::new(()).op(Operation::LedgerTransition(LedgerTransitionOp {
                id: id.clone(),
                from: entry.status,
                to,
                at: now,
            })))
        })
    }

    pub fn entry(&self, id: &LedgerEntryId) -> Result<LedgerEntry, LedgerError> {
        self.read(|state| {
            state
                .ledger_entry(id)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("ledger entry", id))
        })
    }

    /// Filtered, paginated view of the ledger in commit order
    pub fn query(&self, query: &LedgerQuery) -> Page<LedgerEntry> {
        self.read(|state| state.query_ledger(query))
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
