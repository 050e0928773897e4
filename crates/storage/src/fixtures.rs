// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders shared by the storage tests

use crate::operation::*;
use chrono::{DateTime, TimeZone, Utc};
use tally_core::{
    Account, AccountId, CoinPackage, DiscountType, LedgerEntry, LedgerEntryId, LedgerType,
    Package, PackageId, PackageKind, PaymentMethod, UsageLimitType, UsdCents, Voucher,
    VoucherCode, VoucherType,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn account_id(id: &str) -> AccountId {
    AccountId::new(id)
}

pub fn create_account(id: &str) -> Operation {
    Operation::AccountCreate(AccountCreateOp {
        account: Account::new(account_id(id), format!("Reader {}", id), t0()),
    })
}

pub fn coin_package(id: &str, coins: u64, cents: u64) -> Package {
    Package {
        id: PackageId::new(id),
        name: format!("{} coins", coins),
        kind: PackageKind::Coins(CoinPackage {
            coins,
            price: UsdCents(cents),
        }),
        active: true,
        created_at: t0(),
    }
}

pub fn code(raw: &str) -> VoucherCode {
    VoucherCode::parse(raw).unwrap()
}

pub fn voucher(raw: &str, limit_type: UsageLimitType, limit: u32) -> Voucher {
    Voucher {
        code: code(raw),
        voucher_type: VoucherType::Hybrid,
        discount_type: DiscountType::Percent,
        discount_value: 10,
        usage_limit_type: limit_type,
        usage_limit: limit,
        usage_count: 0,
        expires_at: None,
        is_active: true,
        created_at: t0(),
    }
}

pub fn entry(id: &str, account: &str, entry_type: LedgerType) -> LedgerEntry {
    LedgerEntry::new(
        LedgerEntryId::new(id),
        account_id(account),
        entry_type,
        PaymentMethod::Admin,
        "test entry",
        t0(),
    )
}

/// Admin credit batch: balance change plus its ledger entry
pub fn grant(entry_id: &str, account: &str, amount: u64, version: u64) -> Vec<Operation> {
    vec![
        Operation::CoinsCredit(CoinsOp {
            account: account_id(account),
            amount,
            expected_version: version,
        }),
        Operation::LedgerAppend(LedgerAppendOp {
            entry: entry(entry_id, account, LedgerType::AdminGrant).with_coins_received(amount),
        }),
    ]
}

/// Admin debit batch
pub fn deduct(entry_id: &str, account: &str, amount: u64, version: u64) -> Vec<Operation> {
    vec![
        Operation::CoinsDebit(CoinsOp {
            account: account_id(account),
            amount,
            expected_version: version,
        }),
        Operation::LedgerAppend(LedgerAppendOp {
            entry: entry(entry_id, account, LedgerType::AdminDeduction).with_coins_spent(amount),
        }),
    ]
}
