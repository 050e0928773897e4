// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiration sweeper
//!
//! Normalizes lapsed premium accounts back to the free tier. Access checks
//! never wait on it; it only keeps stored state tidy.

use crate::engine::{Engine, Plan};
use crate::entitlement;
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use tally_core::{Clock, IdGen, LedgerEntryId};

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    /// Expire every lapsed membership; returns how many were expired.
    ///
    /// Safe to run concurrently with itself and with purchases: each account
    /// is re-checked under its lock, so one renewed in the meantime is left
    /// alone.
    pub fn sweep(&self) -> Result<usize, LedgerError> {
        let now = self.now();
        let lapsed = self.read(|state| state.lapsed_accounts(now));
        let mut expired = 0;

        for account in &lapsed {
            let locks = self.locks(account, None);
            let _held = locks.hold();

            let result = self.execute("sweep", |state, now| {
                let current = lookup::account(state, account)?;
                if !current.membership.is_lapsed(now) {
                    return Ok(Plan::new(false));
                }
                let entry = LedgerEntryId::generate(self.ids());
                Ok(match entitlement::expire(current, entry, now) {
                    Some(lapse) => lapse.plan(),
                    None => Plan::new(false),
                })
            });
            match result {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) if e.is_retryable() => {
                    tracing::warn!(%account, error = %e, "skipping account this sweep");
                }
                Err(e) => return Err(e),
            }
        }

        if expired > 0 {
            tracing::info!(expired, candidates = lapsed.len(), "sweep expired memberships");
        } else {
            tracing::debug!(candidates = lapsed.len(), "sweep found nothing to expire");
        }
        Ok(expired)
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
