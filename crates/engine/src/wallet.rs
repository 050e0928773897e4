// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coin wallet
//!
//! A balance only moves together with the ledger entry that explains it:
//! callers hand in the entry and both land in the same WAL batch.

use crate::engine::{Engine, Plan};
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use tally_core::{Account, AccountId, Clock, Event, IdGen, LedgerEntry, LedgerEntryId};
use tally_storage::{CoinsOp, LedgerAppendOp, Operation};

/// A planned balance change
pub(crate) struct Movement {
    pub op: Operation,
    pub event: Event,
    pub balance: u64,
}

pub(crate) fn credit(
    account: &Account,
    amount: u64,
    entry: &LedgerEntryId,
) -> Result<Movement, LedgerError> {
    if amount == 0 {
        return Err(LedgerError::invalid("credit amount must be positive"));
    }
    let balance = account
        .coin_balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::invalid("coin balance would overflow"))?;
    Ok(Movement {
        op: Operation::CoinsCredit(CoinsOp {
            account: account.id.clone(),
            amount,
            expected_version: account.version,
        }),
        event: Event::CoinsCredited {
            account: account.id.clone(),
            amount,
            balance,
            entry: entry.clone(),
        },
        balance,
    })
}

pub(crate) fn debit(
    account: &Account,
    amount: u64,
    entry: &LedgerEntryId,
) -> Result<Movement, LedgerError> {
    if amount == 0 {
        return Err(LedgerError::invalid("debit amount must be positive"));
    }
    let balance = account
        .balance_after_debit(amount)
        .map_err(|e| LedgerError::InsufficientFunds {
            balance: e.balance,
            required: e.required,
        })?;
    Ok(Movement {
        op: Operation::CoinsDebit(CoinsOp {
            account: account.id.clone(),
            amount,
            expected_version: account.version,
        }),
        event: Event::CoinsDebited {
            account: account.id.clone(),
            amount,
            balance,
            entry: entry.clone(),
        },
        balance,
    })
}

fn check_entry(account: &AccountId, entry: &LedgerEntry) -> Result<(), LedgerError> {
    if entry.account != *account {
        return Err(LedgerError::invalid(format!(
            "ledger entry {} belongs to account {}",
            entry.id, entry.account
        )));
    }
    Ok(())
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    pub fn balance(&self, account: &AccountId) -> Result<u64, LedgerError> {
        self.read(|state| lookup::account(state, account).map(|a| a.coin_balance))
    }

    /// Add coins, recorded by `entry`; returns the new balance
    pub fn credit(
        &self,
        account: &AccountId,
        amount: u64,
        entry: LedgerEntry,
    ) -> Result<u64, LedgerError> {
        check_entry(account, &entry)?;
        let locks = self.locks(account, None);
        let _held = locks.hold();

        self.execute("credit", |state, _now| {
            let movement = credit(lookup::account(state, account)?, amount, &entry.id)?;
            let entry = entry.clone().with_coins_received(amount);
            Ok(Plan::new(movement.balance)
                .op(movement.op)
                .op(Operation::LedgerAppend(LedgerAppendOp { entry }))
                .event(movement.event))
        })
    }

    /// Remove coins, recorded by `entry`; returns the new balance.
    ///
    /// Fails with `InsufficientFunds` rather than going below zero.
    pub fn debit(
        &self,
        account: &AccountId,
        amount: u64,
        entry: LedgerEntry,
    ) -> Result<u64, LedgerError> {
        check_entry(account, &entry)?;
        let locks = self.locks(account, None);
        let _held = locks.hold();

        self.execute("debit", |state, _now| {
            let movement = debit(lookup::account(state, account)?, amount, &entry.id)?;
            let entry = entry.clone().with_coins_spent(amount);
            Ok(Plan::new(movement.balance)
                .op(movement.op)
                .op(Operation::LedgerAppend(LedgerAppendOp { entry }))
                .event(movement.event))
        })
    }
}

#[cfg(test)]
#[path = "wallet_tests.rs"]
mod tests;
