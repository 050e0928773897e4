// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content access decisions

use crate::engine::Engine;
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use tally_core::{AccountId, Clock, IdGen, ItemRef};

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    /// Whether `account` may read a piece of content.
    ///
    /// An unlocked item is always readable. Otherwise premium content needs an
    /// active membership, and paid content needs an unlock.
    pub fn is_entitled(
        &self,
        account: &AccountId,
        requires_premium: bool,
        price_coins: u64,
        item: Option<&ItemRef>,
    ) -> Result<bool, LedgerError> {
        let now = self.now();
        self.read(|state| {
            let account = lookup::account(state, account)?;
            if item.is_some_and(|item| state.has_unlock(&account.id, item)) {
                return Ok(true);
            }
            if requires_premium {
                return Ok(account.is_active(now));
            }
            Ok(price_coins == 0)
        })
    }
}

#[cfg(test)]
#[path = "gating_tests.rs"]
mod tests;
