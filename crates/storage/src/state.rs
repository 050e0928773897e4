// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory ledger state
//!
//! Everything the engine reads lives here, rebuilt from a snapshot plus the
//! WAL tail. The store hands each batch to [`MaterializedState::apply_batch`]
//! before writing it, so every rule a committed batch must satisfy is
//! enforced in this file.
//!
//! Operations in a batch run in order and each one sees the effects of
//! those before it. Each records how to reverse itself; a rejection replays
//! those reversals newest first.

use crate::operation::*;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tally_core::{
    Account, AccountId, ItemRef, LedgerEntry, LedgerEntryId, LedgerQuery, Membership, Package,
    PackageId, Page, Purchase, PurchaseDetails, PurchaseId, Status, UsageLimitType, Voucher,
    VoucherCode, VoucherPurpose, VoucherRejection, VoucherUsage, VoucherUses,
};
use thiserror::Error;

/// Why a batch was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },
    #[error("invalid {kind} transition for {id}: {from} -> {to}")]
    InvalidTransition {
        kind: &'static str,
        id: String,
        from: Status,
        to: Status,
    },
    #[error("version conflict on account {account}: expected {expected}, found {actual}")]
    VersionConflict {
        account: AccountId,
        expected: u64,
        actual: u64,
    },
    #[error("insufficient funds on account {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: AccountId,
        balance: u64,
        required: u64,
    },
    #[error("voucher {code} rejected: {reason}")]
    VoucherRejected {
        code: VoucherCode,
        reason: VoucherRejection,
    },
    #[error("batch mutates account {0} without a ledger entry")]
    UnrecordedMutation(AccountId),
    #[error("invalid operation: {0}")]
    Invalid(String),
}

#[derive(Debug)]
enum Undo {
    RemoveAccount(AccountId),
    RestoreAccount(Box<Account>),
    RemovePackage(PackageId),
    RestorePackage(Box<Package>),
    RemoveVoucher(VoucherCode),
    RestoreVoucher(Box<Voucher>),
    RemovePurchase(PurchaseId),
    RestorePurchase(Box<Purchase>),
    PopLedger,
    RestoreLedgerEntry(Box<LedgerEntry>),
    PopUsage,
    RemoveUnlock(AccountId, ItemRef),
}

/// How to take back a batch that was applied but could not be written
#[derive(Debug, Default)]
#[must_use]
pub struct UndoLog {
    steps: Vec<Undo>,
}

impl UndoLog {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Accounts, catalogue, purchases, ledger, redemptions and unlocks
#[derive(Debug, Clone, Default)]
pub struct MaterializedState {
    accounts: HashMap<AccountId, Account>,
    packages: HashMap<PackageId, Package>,
    vouchers: HashMap<VoucherCode, Voucher>,
    purchases: HashMap<PurchaseId, Purchase>,
    /// Commit order
    ledger: Vec<LedgerEntry>,
    ledger_index: HashMap<LedgerEntryId, usize>,
    voucher_usages: Vec<VoucherUsage>,
    unlocks: HashSet<(AccountId, ItemRef)>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from snapshot contents
    pub(crate) fn from_parts(
        accounts: Vec<Account>,
        packages: Vec<Package>,
        vouchers: Vec<Voucher>,
        purchases: Vec<Purchase>,
        ledger: Vec<LedgerEntry>,
        voucher_usages: Vec<VoucherUsage>,
        unlocks: Vec<(AccountId, ItemRef)>,
    ) -> Self {
        let ledger_index = ledger
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id.clone(), i))
            .collect();
        Self {
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
            packages: packages.into_iter().map(|p| (p.id.clone(), p)).collect(),
            vouchers: vouchers.into_iter().map(|v| (v.code.clone(), v)).collect(),
            purchases: purchases.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ledger,
            ledger_index,
            voucher_usages,
            unlocks: unlocks.into_iter().collect(),
        }
    }

    /// Apply every operation in `batch` or none of them.
    ///
    /// Returns the undo steps on success; on failure they have already run.
    pub fn apply_batch(&mut self, batch: &[Operation]) -> Result<UndoLog, ApplyError> {
        check_recorded(batch)?;

        let mut undo = UndoLog::default();
        for op in batch {
            if let Err(e) = self.apply(op, &mut undo.steps) {
                self.rollback(undo);
                return Err(e);
            }
        }
        Ok(undo)
    }

    /// Take back a batch [`apply_batch`](Self::apply_batch) accepted
    pub fn rollback(&mut self, undo: UndoLog) {
        for step in undo.steps.into_iter().rev() {
            match step {
                Undo::RemoveAccount(id) => {
                    self.accounts.remove(&id);
                }
                Undo::RestoreAccount(account) => {
                    self.accounts.insert(account.id.clone(), *account);
                }
                Undo::RemovePackage(id) => {
                    self.packages.remove(&id);
                }
                Undo::RestorePackage(package) => {
                    self.packages.insert(package.id.clone(), *package);
                }
                Undo::RemoveVoucher(code) => {
                    self.vouchers.remove(&code);
                }
                Undo::RestoreVoucher(voucher) => {
                    self.vouchers.insert(voucher.code.clone(), *voucher);
                }
                Undo::RemovePurchase(id) => {
                    self.purchases.remove(&id);
                }
                Undo::RestorePurchase(purchase) => {
                    self.purchases.insert(purchase.id.clone(), *purchase);
                }
                Undo::PopLedger => {
                    if let Some(entry) = self.ledger.pop() {
                        self.ledger_index.remove(&entry.id);
                    }
                }
                Undo::RestoreLedgerEntry(entry) => {
                    if let Some(&i) = self.ledger_index.get(&entry.id) {
                        self.ledger[i] = *entry;
                    }
                }
                Undo::PopUsage => {
                    self.voucher_usages.pop();
                }
                Undo::RemoveUnlock(account, item) => {
                    self.unlocks.remove(&(account, item));
                }
            }
        }
    }

    fn apply(&mut self, op: &Operation, undo: &mut Vec<Undo>) -> Result<(), ApplyError> {
        match op {
            Operation::AccountCreate(create) => {
                let id = &create.account.id;
                if self.accounts.contains_key(id) {
                    return Err(already_exists("account", id));
                }
                self.accounts.insert(id.clone(), create.account.clone());
                undo.push(Undo::RemoveAccount(id.clone()));
            }

            Operation::PackageCreate(create) => {
                let id = &create.package.id;
                if self.packages.contains_key(id) {
                    return Err(already_exists("package", id));
                }
                create.package.validate().map_err(ApplyError::Invalid)?;
                self.packages.insert(id.clone(), create.package.clone());
                undo.push(Undo::RemovePackage(id.clone()));
            }

            Operation::PackageDeactivate(deactivate) => {
                let package = self
                    .packages
                    .get_mut(&deactivate.id)
                    .ok_or_else(|| not_found("package", &deactivate.id))?;
                undo.push(Undo::RestorePackage(Box::new(package.clone())));
                package.active = false;
            }

            Operation::VoucherCreate(create) => {
                let code = &create.voucher.code;
                if self.vouchers.contains_key(code) {
                    return Err(already_exists("voucher", code));
                }
                create.voucher.validate().map_err(ApplyError::Invalid)?;
                self.vouchers.insert(code.clone(), create.voucher.clone());
                undo.push(Undo::RemoveVoucher(code.clone()));
            }

            Operation::VoucherDeactivate(deactivate) => {
                let voucher = self
                    .vouchers
                    .get_mut(&deactivate.code)
                    .ok_or_else(|| not_found("voucher", &deactivate.code))?;
                undo.push(Undo::RestoreVoucher(Box::new(voucher.clone())));
                voucher.is_active = false;
            }

            Operation::PurchaseCreate(create) => {
                let purchase = &create.purchase;
                if self.purchases.contains_key(&purchase.id) {
                    return Err(already_exists("purchase", &purchase.id));
                }
                if purchase.status != Status::Pending {
                    return Err(ApplyError::Invalid(format!(
                        "purchase {} must start pending, got {}",
                        purchase.id, purchase.status
                    )));
                }
                self.require_account(&purchase.account)?;
                if !self.packages.contains_key(&purchase.package) {
                    return Err(not_found("package", &purchase.package));
                }
                if let Some(applied) = &purchase.voucher {
                    // The purchase holds one slot of the voucher's limit from here on
                    let PurchaseDetails::Membership { .. } = purchase.details else {
                        return Err(ApplyError::Invalid(format!(
                            "purchase {} cannot carry a voucher",
                            purchase.id
                        )));
                    };
                    let uses = self.voucher_uses(&applied.code, &purchase.account);
                    let voucher = self
                        .vouchers
                        .get(&applied.code)
                        .ok_or_else(|| not_found("voucher", &applied.code))?;
                    voucher
                        .check(VoucherPurpose::Membership, uses, purchase.created_at)
                        .map_err(|reason| ApplyError::VoucherRejected {
                            code: applied.code.clone(),
                            reason,
                        })?;
                }
                self.purchases.insert(purchase.id.clone(), purchase.clone());
                undo.push(Undo::RemovePurchase(purchase.id.clone()));
            }

            Operation::PurchaseTransition(transition) => {
                let purchase = self
                    .purchases
                    .get_mut(&transition.id)
                    .ok_or_else(|| not_found("purchase", &transition.id))?;
                let invalid = || ApplyError::InvalidTransition {
                    kind: "purchase",
                    id: transition.id.to_string(),
                    from: purchase.status,
                    to: transition.to,
                };
                if purchase.status != transition.from {
                    return Err(invalid());
                }
                let status = purchase
                    .status
                    .transition(transition.to)
                    .map_err(|_| invalid())?;

                undo.push(Undo::RestorePurchase(Box::new(purchase.clone())));
                purchase.status = status;
                purchase.updated_at = transition.at;
                if let Some(reference) = &transition.transaction_id {
                    purchase.transaction_id = Some(reference.clone());
                }
                if let Some(entry) = &transition.ledger_entry {
                    purchase.ledger_entry = Some(entry.clone());
                }
                if let PurchaseDetails::Membership {
                    starts_at,
                    expires_at,
                    ..
                } = &mut purchase.details
                {
                    if transition.starts_at.is_some() {
                        *starts_at = transition.starts_at;
                    }
                    if transition.expires_at.is_some() {
                        *expires_at = transition.expires_at;
                    }
                }
            }

            Operation::CoinsCredit(credit) => {
                let account = self.versioned_account(&credit.account, credit.expected_version)?;
                if credit.amount == 0 {
                    return Err(ApplyError::Invalid("credit amount must be positive".into()));
                }
                let balance = account
                    .coin_balance
                    .checked_add(credit.amount)
                    .ok_or_else(|| ApplyError::Invalid("coin balance overflow".into()))?;
                undo.push(Undo::RestoreAccount(Box::new(account.clone())));
                account.coin_balance = balance;
                account.version += 1;
            }

            Operation::CoinsDebit(debit) => {
                let account = self.versioned_account(&debit.account, debit.expected_version)?;
                if debit.amount == 0 {
                    return Err(ApplyError::Invalid("debit amount must be positive".into()));
                }
                let balance = account.balance_after_debit(debit.amount).map_err(|e| {
                    ApplyError::InsufficientFunds {
                        account: debit.account.clone(),
                        balance: e.balance,
                        required: e.required,
                    }
                })?;
                undo.push(Undo::RestoreAccount(Box::new(account.clone())));
                account.coin_balance = balance;
                account.version += 1;
            }

            Operation::MembershipSet(set) => {
                let account = self.versioned_account(&set.account, set.expected_version)?;
                if !set.tier.is_paid() {
                    return Err(ApplyError::Invalid(
                        "membership can only be set to a paid tier".into(),
                    ));
                }
                undo.push(Undo::RestoreAccount(Box::new(account.clone())));
                account.membership = Membership {
                    tier: set.tier,
                    expires_at: Some(set.expires_at),
                };
                account.version += 1;
            }

            Operation::MembershipExpire(expire) => {
                let account = self.versioned_account(&expire.account, expire.expected_version)?;
                undo.push(Undo::RestoreAccount(Box::new(account.clone())));
                account.membership = Membership::free();
                account.version += 1;
            }

            Operation::UnlockCreate(unlock) => {
                self.require_account(&unlock.account)?;
                let key = (unlock.account.clone(), unlock.item.clone());
                if self.unlocks.contains(&key) {
                    return Err(ApplyError::AlreadyExists {
                        kind: "unlock",
                        id: format!("{}/{}", unlock.account, unlock.item),
                    });
                }
                self.unlocks.insert(key);
                undo.push(Undo::RemoveUnlock(
                    unlock.account.clone(),
                    unlock.item.clone(),
                ));
            }

            Operation::LedgerAppend(append) => {
                let entry = &append.entry;
                if self.ledger_index.contains_key(&entry.id) {
                    return Err(already_exists("ledger entry", &entry.id));
                }
                self.require_account(&entry.account)?;
                if let Some(package) = &entry.package {
                    if !self.packages.contains_key(package) {
                        return Err(not_found("package", package));
                    }
                }
                if let Some(purchase) = &entry.purchase {
                    if !self.purchases.contains_key(purchase) {
                        return Err(not_found("purchase", purchase));
                    }
                }
                self.ledger_index
                    .insert(entry.id.clone(), self.ledger.len());
                self.ledger.push(entry.clone());
                undo.push(Undo::PopLedger);
            }

            Operation::LedgerTransition(transition) => {
                let index = *self
                    .ledger_index
                    .get(&transition.id)
                    .ok_or_else(|| not_found("ledger entry", &transition.id))?;
                let entry = &mut self.ledger[index];
                let invalid = || ApplyError::InvalidTransition {
                    kind: "ledger entry",
                    id: transition.id.to_string(),
                    from: entry.status,
                    to: transition.to,
                };
                if entry.status != transition.from {
                    return Err(invalid());
                }
                let status = entry.status.transition(transition.to).map_err(|_| invalid())?;

                undo.push(Undo::RestoreLedgerEntry(Box::new(entry.clone())));
                entry.status = status;
                entry.updated_at = transition.at;
            }

            Operation::VoucherRedeem(redeem) => {
                let usage = &redeem.usage;
                self.require_account(&usage.account)?;
                if !self.ledger_index.contains_key(&usage.ledger_entry) {
                    return Err(not_found("ledger entry", &usage.ledger_entry));
                }
                let settles_hold = self.settles_hold(usage)?;
                let uses = self.voucher_uses(&usage.code, &usage.account);
                let voucher = self
                    .vouchers
                    .get_mut(&usage.code)
                    .ok_or_else(|| not_found("voucher", &usage.code))?;
                // A completed purchase redeems the slot it held, even if the
                // voucher has since expired or been switched off
                if !settles_hold {
                    voucher
                        .check(usage.used_for, uses, usage.used_at)
                        .map_err(|reason| ApplyError::VoucherRejected {
                            code: usage.code.clone(),
                            reason,
                        })?;
                }

                if voucher.usage_limit_type == UsageLimitType::Global {
                    undo.push(Undo::RestoreVoucher(Box::new(voucher.clone())));
                    voucher.usage_count += 1;
                }
                self.voucher_usages.push(usage.clone());
                undo.push(Undo::PopUsage);
            }

            Operation::SnapshotTaken { .. } => {}
        }

        Ok(())
    }

    fn require_account(&self, id: &AccountId) -> Result<(), ApplyError> {
        if self.accounts.contains_key(id) {
            Ok(())
        } else {
            Err(not_found("account", id))
        }
    }

    /// Whether `usage` redeems the slot a now-completed purchase held.
    ///
    /// Errors if the purchase was already redeemed or never carried the code.
    fn settles_hold(&self, usage: &VoucherUsage) -> Result<bool, ApplyError> {
        let Some(id) = &usage.purchase else {
            return Ok(false);
        };
        let purchase = self.purchases.get(id).ok_or_else(|| not_found("purchase", id))?;
        if purchase.voucher.as_ref().map(|v| &v.code) != Some(&usage.code) {
            return Err(ApplyError::Invalid(format!(
                "purchase {} was not priced with voucher {}",
                id, usage.code
            )));
        }
        if purchase.status != Status::Completed {
            return Err(ApplyError::Invalid(format!(
                "purchase {} must complete before its voucher is redeemed",
                id
            )));
        }
        if self.voucher_usages.iter().any(|u| u.purchase.as_ref() == Some(id)) {
            return Err(already_exists("redemption for purchase", id));
        }
        Ok(true)
    }

    fn versioned_account(
        &mut self,
        id: &AccountId,
        expected: u64,
    ) -> Result<&mut Account, ApplyError> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| not_found("account", id))?;
        if account.version != expected {
            return Err(ApplyError::VersionConflict {
                account: id.clone(),
                expected,
                actual: account.version,
            });
        }
        Ok(account)
    }

    // === Queries ===

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// All accounts, oldest first
    pub fn accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<_> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        accounts
    }

    pub fn package(&self, id: &PackageId) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn packages(&self) -> Vec<&Package> {
        let mut packages: Vec<_> = self.packages.values().collect();
        packages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        packages
    }

    pub fn voucher(&self, code: &VoucherCode) -> Option<&Voucher> {
        self.vouchers.get(code)
    }

    pub fn vouchers(&self) -> Vec<&Voucher> {
        let mut vouchers: Vec<_> = self.vouchers.values().collect();
        vouchers.sort_by(|a, b| a.code.cmp(&b.code));
        vouchers
    }

    pub fn purchase(&self, id: &PurchaseId) -> Option<&Purchase> {
        self.purchases.get(id)
    }

    /// Purchases made by an account, oldest first
    pub fn purchases_for(&self, account: &AccountId) -> Vec<&Purchase> {
        let mut purchases: Vec<_> = self
            .purchases
            .values()
            .filter(|p| &p.account == account)
            .collect();
        purchases.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        purchases
    }

    pub(crate) fn all_purchases(&self) -> impl Iterator<Item = &Purchase> {
        self.purchases.values()
    }

    /// Every ledger entry in commit order
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn ledger_entry(&self, id: &LedgerEntryId) -> Option<&LedgerEntry> {
        self.ledger_index.get(id).and_then(|&i| self.ledger.get(i))
    }

    pub fn query_ledger(&self, query: &LedgerQuery) -> Page<LedgerEntry> {
        query.run(self.ledger.iter())
    }

    /// Redemption log rows, in commit order
    pub fn voucher_usages(&self) -> &[VoucherUsage] {
        &self.voucher_usages
    }

    pub fn redemptions<'a>(
        &'a self,
        code: &'a VoucherCode,
    ) -> impl Iterator<Item = &'a VoucherUsage> + 'a {
        self.voucher_usages.iter().filter(move |u| &u.code == code)
    }

    /// Redemption rows for one (voucher, account) pair
    pub fn user_redemptions(&self, code: &VoucherCode, account: &AccountId) -> u32 {
        let count = self
            .redemptions(code)
            .filter(|u| &u.account == account)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Redemptions and pending-purchase holds on `code`, as seen by `account`
    pub fn voucher_uses(&self, code: &VoucherCode, account: &AccountId) -> VoucherUses {
        let mut uses = VoucherUses::redeemed(self.user_redemptions(code, account));
        let holders = self.purchases.values().filter(|p| {
            p.status == Status::Pending && p.voucher.as_ref().is_some_and(|v| &v.code == code)
        });
        for purchase in holders {
            uses.held += 1;
            if &purchase.account == account {
                uses.user_held += 1;
            }
        }
        uses
    }

    pub fn has_unlock(&self, account: &AccountId, item: &ItemRef) -> bool {
        self.unlocks.contains(&(account.clone(), item.clone()))
    }

    /// Items an account owns, sorted
    pub fn unlocks_for(&self, account: &AccountId) -> Vec<&ItemRef> {
        let mut items: Vec<_> = self
            .unlocks
            .iter()
            .filter(|(a, _)| a == account)
            .map(|(_, item)| item)
            .collect();
        items.sort();
        items
    }

    pub(crate) fn all_unlocks(&self) -> impl Iterator<Item = &(AccountId, ItemRef)> {
        self.unlocks.iter()
    }

    /// Premium accounts whose expiry is at or before `now`
    pub fn lapsed_accounts(&self, now: DateTime<Utc>) -> Vec<AccountId> {
        let lapsed: BTreeSet<_> = self
            .accounts
            .values()
            .filter(|a| a.membership.is_lapsed(now))
            .map(|a| a.id.clone())
            .collect();
        lapsed.into_iter().collect()
    }
}

/// Every account whose balance or entitlements change must also receive a
/// ledger entry in the same batch.
fn check_recorded(batch: &[Operation]) -> Result<(), ApplyError> {
    let recorded: HashSet<&AccountId> = batch
        .iter()
        .filter_map(|op| match op {
            Operation::LedgerAppend(append) => Some(&append.entry.account),
            _ => None,
        })
        .collect();

    for op in batch.iter().filter(|op| op.is_entitlement_mutation()) {
        let account = match op {
            Operation::CoinsCredit(c) | Operation::CoinsDebit(c) => &c.account,
            Operation::MembershipSet(set) => &set.account,
            Operation::MembershipExpire(expire) => &expire.account,
            Operation::UnlockCreate(unlock) => &unlock.account,
            _ => continue,
        };
        if !recorded.contains(account) {
            return Err(ApplyError::UnrecordedMutation(account.clone()));
        }
    }
    Ok(())
}

fn not_found(kind: &'static str, id: &impl ToString) -> ApplyError {
    ApplyError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn already_exists(kind: &'static str, id: &impl ToString) -> ApplyError {
    ApplyError::AlreadyExists {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
