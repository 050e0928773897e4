// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator adjustments, each recorded with an `admin_*` ledger type

use crate::engine::Engine;
use crate::error::LedgerError;
use crate::notify::NotifyAdapter;
use tally_core::{
    AccountId, Activation, Clock, IdGen, LedgerEntry, LedgerEntryId, LedgerType, PaymentMethod,
    Tier,
};

fn reason_text(reason: &str) -> Result<&str, LedgerError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(LedgerError::invalid("admin adjustments need a reason"));
    }
    Ok(reason)
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    fn admin_entry(&self, account: &AccountId, entry_type: LedgerType, reason: &str) -> LedgerEntry {
        LedgerEntry::new(
            LedgerEntryId::generate(self.ids()),
            account.clone(),
            entry_type,
            PaymentMethod::Admin,
            reason,
            self.now(),
        )
    }

    /// Returns the new balance
    pub fn grant_coins(
        &self,
        account: &AccountId,
        amount: u64,
        reason: &str,
    ) -> Result<u64, LedgerError> {
        let reason = reason_text(reason)?;
        let entry = self.admin_entry(account, LedgerType::AdminGrant, reason);
        let balance = self.credit(account, amount, entry)?;
        tracing::info!(%account, amount, balance, reason, "admin granted coins");
        Ok(balance)
    }

    /// Returns the new balance; never goes below zero
    pub fn deduct_coins(
        &self,
        account: &AccountId,
        amount: u64,
        reason: &str,
    ) -> Result<u64, LedgerError> {
        let reason = reason_text(reason)?;
        let entry = self.admin_entry(account, LedgerType::AdminDeduction, reason);
        let balance = self.debit(account, amount, entry)?;
        tracing::info!(%account, amount, balance, reason, "admin deducted coins");
        Ok(balance)
    }

    /// Grant membership time with the same extend-or-start rule as a purchase
    pub fn grant_membership(
        &self,
        account: &AccountId,
        tier: Tier,
        days: u32,
        reason: &str,
    ) -> Result<Activation, LedgerError> {
        let reason = reason_text(reason)?;
        let entry = self.admin_entry(account, LedgerType::AdminMembershipGrant, reason);
        let activation = self.activate(account, tier, days, entry)?;
        tracing::info!(
            %account,
            %tier,
            days,
            kind = ?activation.kind,
            reason,
            "admin granted membership"
        );
        Ok(activation)
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
