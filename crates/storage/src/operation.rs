// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL operation types
//!
//! Every state change is one of these operations. A commit is a batch of
//! them, validated against the current state and applied all-or-nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
    Account, AccountId, ItemRef, LedgerEntry, LedgerEntryId, Package, PackageId, Purchase,
    PurchaseId, Status, Tier, Voucher, VoucherCode, VoucherUsage,
};

/// All state-changing operations in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    // Catalogue
    AccountCreate(AccountCreateOp),
    PackageCreate(PackageCreateOp),
    PackageDeactivate(PackageDeactivateOp),
    VoucherCreate(VoucherCreateOp),
    VoucherDeactivate(VoucherDeactivateOp),

    // Purchases
    PurchaseCreate(PurchaseCreateOp),
    PurchaseTransition(PurchaseTransitionOp),

    // Wallet
    CoinsCredit(CoinsOp),
    CoinsDebit(CoinsOp),

    // Entitlements
    MembershipSet(MembershipSetOp),
    MembershipExpire(MembershipExpireOp),
    UnlockCreate(UnlockCreateOp),

    // Ledger and redemption log
    LedgerAppend(LedgerAppendOp),
    LedgerTransition(LedgerTransitionOp),
    VoucherRedeem(VoucherRedeemOp),

    /// Marker written after a snapshot; no state change
    SnapshotTaken {
        snapshot_id: String,
    },
}

impl Operation {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AccountCreate(_) => "account_create",
            Operation::PackageCreate(_) => "package_create",
            Operation::PackageDeactivate(_) => "package_deactivate",
            Operation::VoucherCreate(_) => "voucher_create",
            Operation::VoucherDeactivate(_) => "voucher_deactivate",
            Operation::PurchaseCreate(_) => "purchase_create",
            Operation::PurchaseTransition(_) => "purchase_transition",
            Operation::CoinsCredit(_) => "coins_credit",
            Operation::CoinsDebit(_) => "coins_debit",
            Operation::MembershipSet(_) => "membership_set",
            Operation::MembershipExpire(_) => "membership_expire",
            Operation::UnlockCreate(_) => "unlock_create",
            Operation::LedgerAppend(_) => "ledger_append",
            Operation::LedgerTransition(_) => "ledger_transition",
            Operation::VoucherRedeem(_) => "voucher_redeem",
            Operation::SnapshotTaken { .. } => "snapshot_taken",
        }
    }

    /// Whether the operation mutates a coin balance or membership
    pub fn is_entitlement_mutation(&self) -> bool {
        matches!(
            self,
            Operation::CoinsCredit(_)
                | Operation::CoinsDebit(_)
                | Operation::MembershipSet(_)
                | Operation::MembershipExpire(_)
                | Operation::UnlockCreate(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateOp {
    pub account: Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCreateOp {
    pub package: Package,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDeactivateOp {
    pub id: PackageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherCreateOp {
    pub voucher: Voucher,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherDeactivateOp {
    pub code: VoucherCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCreateOp {
    pub purchase: Purchase,
}

/// Move a purchase along the settlement state machine.
///
/// `from` must match the stored status at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTransitionOp {
    pub id: PurchaseId,
    pub from: Status,
    pub to: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_entry: Option<LedgerEntryId>,
    /// Resolved membership window, set on completion of membership purchases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

/// Credit or debit a coin balance.
///
/// `expected_version` is the account version the caller read; a mismatch at
/// commit rejects the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinsOp {
    pub account: AccountId,
    pub amount: u64,
    pub expected_version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSetOp {
    pub account: AccountId,
    pub tier: Tier,
    pub expires_at: DateTime<Utc>,
    pub expected_version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipExpireOp {
    pub account: AccountId,
    pub expected_version: u64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCreateOp {
    pub account: AccountId,
    pub item: ItemRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAppendOp {
    pub entry: LedgerEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransitionOp {
    pub id: LedgerEntryId,
    pub from: Status,
    pub to: Status,
    pub at: DateTime<Utc>,
}

/// Append a redemption row; for global vouchers also bumps `usage_count`.
///
/// The voucher's redemption checks are re-run against committed state, so
/// the limit check and the increment are a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRedeemOp {
    pub usage: VoucherUsage,
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
