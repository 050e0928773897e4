// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Voucher validation, discounts and redemption records

use crate::engine::{Engine, Plan};
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_core::{
    AccountId, Clock, Event, IdGen, LedgerEntryId, PurchaseId, UsageLimitType, Voucher,
    VoucherCode, VoucherPurpose, VoucherRejection, VoucherUsage,
};
use tally_storage::{MaterializedState, Operation, VoucherRedeemOp};

/// Discount a voucher would give on an amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub code: VoucherCode,
    pub original: u64,
    pub discount: u64,
    pub final_amount: u64,
}

/// A global voucher whose cached counter disagrees with its redemption log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageDrift {
    pub code: VoucherCode,
    pub cached: u32,
    pub actual: u32,
}

/// Normalize a user-entered code; unusable codes are reported as not found
pub(crate) fn parse_code(raw: &str) -> Result<VoucherCode, LedgerError> {
    VoucherCode::parse(raw).ok_or(LedgerError::InvalidVoucher(VoucherRejection::NotFound))
}

/// Look up a voucher and run its redemption checks for `account`.
///
/// Pending purchases priced with the voucher count against its limit.
pub(crate) fn usable<'a>(
    state: &'a MaterializedState,
    code: &VoucherCode,
    account: &AccountId,
    purpose: VoucherPurpose,
    now: DateTime<Utc>,
) -> Result<&'a Voucher, LedgerError> {
    let voucher = state
        .voucher(code)
        .ok_or(LedgerError::InvalidVoucher(VoucherRejection::NotFound))?;
    voucher
        .check(purpose, state.voucher_uses(code, account), now)
        .map_err(LedgerError::InvalidVoucher)?;
    Ok(voucher)
}

/// Plan a redemption row. The store checks the voucher again on commit, except
/// when the row settles the slot a completed purchase held.
pub(crate) fn redeem(
    code: &VoucherCode,
    account: &AccountId,
    used_for: VoucherPurpose,
    discount: u64,
    purchase: Option<PurchaseId>,
    entry: &LedgerEntryId,
    now: DateTime<Utc>,
) -> (VoucherUsage, Event) {
    let usage = VoucherUsage {
        code: code.clone(),
        account: account.clone(),
        used_for,
        discount_amount: discount,
        purchase,
        ledger_entry: entry.clone(),
        used_at: now,
    };
    (
        usage,
        Event::VoucherRedeemed {
            code: code.clone(),
            account: account.clone(),
            discount,
        },
    )
}

pub(crate) fn redeem_op(usage: VoucherUsage) -> Operation {
    Operation::VoucherRedeem(VoucherRedeemOp { usage })
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    /// Check that `account` may redeem `code` for `purpose` right now.
    ///
    /// The checks run in order (exists, active, not expired, type, usage
    /// limit) and the first failure is reported.
    pub fn validate_voucher(
        &self,
        code: &str,
        account: &AccountId,
        purpose: VoucherPurpose,
    ) -> Result<Voucher, LedgerError> {
        let code = parse_code(code)?;
        let now = self.now();
        self.read(|state| {
            lookup::account(state, account)?;
            usable(state, &code, account, purpose, now).cloned()
        })
    }

    /// Validate `code` and price `amount` with it
    pub fn quote(
        &self,
        code: &str,
        account: &AccountId,
        purpose: VoucherPurpose,
        amount: u64,
    ) -> Result<Quote, LedgerError> {
        let voucher = self.validate_voucher(code, account, purpose)?;
        let discount = voucher.calculate_discount(amount);
        Ok(Quote {
            code: voucher.code,
            original: amount,
            discount,
            final_amount: amount - discount,
        })
    }

    /// Record a redemption against an existing ledger entry.
    ///
    /// The limit is checked again when the row commits, so concurrent
    /// redemptions of a global voucher never overshoot it.
    pub fn record_usage(
        &self,
        code: &str,
        account: &AccountId,
        used_for: VoucherPurpose,
        discount: u64,
        entry: &LedgerEntryId,
    ) -> Result<VoucherUsage, LedgerError> {
        let code = parse_code(code)?;
        let locks = self.locks(account, Some(&code));
        let _held = locks.hold();

        self.execute("record_usage", |state, now| {
            lookup::account(state, account)?;
            let recorded = state
                .ledger_entry(entry)
                .ok_or_else(|| LedgerError::not_found("ledger entry", entry))?;
            if recorded.account != *account {
                return Err(LedgerError::invalid(format!(
                    "ledger entry {} belongs to account {}",
                    entry, recorded.account
                )));
            }
            usable(state, &code, account, used_for, now)?;
            let (usage, event) = redeem(&code, account, used_for, discount, None, entry, now);
            Ok(Plan::new(usage.clone())
                .op(redeem_op(usage))
                .event(event))
        })
    }

    /// Redemption rows for one voucher, in commit order
    pub fn voucher_usages(&self, code: &str) -> Result<Vec<VoucherUsage>, LedgerError> {
        let code = parse_code(code)?;
        self.read(|state| {
            if state.voucher(&code).is_none() {
                return Err(LedgerError::not_found("voucher", &code));
            }
            Ok(state.redemptions(&code).cloned().collect())
        })
    }

    /// Compare each global voucher's cached counter with its redemption log
    pub fn audit_usage(&self) -> Vec<UsageDrift> {
        self.read(|state| {
            state
                .vouchers()
                .into_iter()
                .filter(|v| v.usage_limit_type == UsageLimitType::Global)
                .filter_map(|v| {
                    let actual = u32::try_from(state.redemptions(&v.code).count())
                        .unwrap_or(u32::MAX);
                    (actual != v.usage_count).then(|| UsageDrift {
                        code: v.code.clone(),
                        cached: v.usage_count,
                        actual,
                    })
                })
                .collect()
        })
    }
}

#[cfg(test)]
#[path = "voucher_tests.rs"]
mod tests;
