// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accounts, packages and voucher definitions

use crate::engine::{Engine, Plan};
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use crate::voucher::parse_code;
use chrono::{DateTime, Utc};
use tally_core::{
    Account, AccountId, Clock, CoinPackage, DiscountType, IdGen, ItemRef, MembershipPackage,
    Package, PackageId, PackageKind, UsageLimitType, UsdCents, Voucher, VoucherCode, VoucherType,
};
use tally_storage::{
    AccountCreateOp, Operation, PackageCreateOp, PackageDeactivateOp, VoucherCreateOp,
    VoucherDeactivateOp,
};

/// Voucher definition as entered by an operator
#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub code: String,
    pub voucher_type: VoucherType,
    pub discount_type: DiscountType,
    pub discount_value: u64,
    pub usage_limit_type: UsageLimitType,
    pub usage_limit: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    pub fn create_account(&self, name: &str) -> Result<Account, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::invalid("account name must not be empty"));
        }
        let id = AccountId::generate(self.ids());
        self.execute("create_account", |_state, now| {
            let account = Account::new(id.clone(), name, now);
            Ok(Plan::new(account.clone()).op(Operation::AccountCreate(AccountCreateOp { account })))
        })
    }

    pub fn account(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.read(|state| lookup::account(state, id).cloned())
    }

    /// All accounts, sorted by id
    pub fn accounts(&self) -> Vec<Account> {
        self.read(|state| state.accounts().into_iter().cloned().collect())
    }

    /// Items the account owns outright
    pub fn unlocks(&self, account: &AccountId) -> Result<Vec<ItemRef>, LedgerError> {
        self.read(|state| {
            lookup::account(state, account)?;
            Ok(state.unlocks_for(account).into_iter().cloned().collect())
        })
    }

    pub fn create_coin_package(
        &self,
        name: &str,
        coins: u64,
        price: UsdCents,
    ) -> Result<Package, LedgerError> {
        self.create_package(name, PackageKind::Coins(CoinPackage { coins, price }))
    }

    pub fn create_membership_package(
        &self,
        name: &str,
        membership: MembershipPackage,
    ) -> Result<Package, LedgerError> {
        self.create_package(name, PackageKind::Membership(membership))
    }

    fn create_package(&self, name: &str, kind: PackageKind) -> Result<Package, LedgerError> {
        let id = PackageId::generate(self.ids());
        self.execute("create_package", |_state, now| {
            let package = Package {
                id: id.clone(),
                name: name.trim().to_string(),
                kind: kind.clone(),
                active: true,
                created_at: now,
            };
            package.validate().map_err(LedgerError::InvalidInput)?;
            Ok(Plan::new(package.clone()).op(Operation::PackageCreate(PackageCreateOp { package })))
        })
    }

    /// Retire a package from sale; existing purchases are unaffected
    pub fn deactivate_package(&self, id: &PackageId) -> Result<(), LedgerError> {
        self.execute("deactivate_package", |state, _now| {
            let package = lookup::package(state, id)?;
            if !package.active {
                return Ok(Plan::new(()));
            }
            Ok(Plan::new(()).op(Operation::PackageDeactivate(PackageDeactivateOp {
                id: id.clone(),
            })))
        })
    }

    pub fn package(&self, id: &PackageId) -> Result<Package, LedgerError> {
        self.read(|state| lookup::package(state, id).cloned())
    }

    /// Packages sorted by id, optionally only those on sale
    pub fn packages(&self, active_only: bool) -> Vec<Package> {
        self.read(|state| {
            state
                .packages()
                .into_iter()
                .filter(|p| p.active || !active_only)
                .cloned()
                .collect()
        })
    }

    pub fn create_voucher(&self, new: NewVoucher) -> Result<Voucher, LedgerError> {
        let code = VoucherCode::parse(&new.code).ok_or_else(|| {
            LedgerError::invalid(format!(
                "invalid voucher code '{}': use 1-64 letters, digits, '-' or '_'",
                new.code.trim()
            ))
        })?;
        self.execute("create_voucher", |state, now| {
            if state.voucher(&code).is_some() {
                return Err(LedgerError::invalid(format!("voucher {} already exists", code)));
            }
            let voucher = Voucher {
                code: code.clone(),
                voucher_type: new.voucher_type,
                discount_type: new.discount_type,
                discount_value: new.discount_value,
                usage_limit_type: new.usage_limit_type,
                usage_limit: new.usage_limit,
                usage_count: 0,
                expires_at: new.expires_at,
                is_active: true,
                created_at: now,
            };
            voucher.validate().map_err(LedgerError::InvalidInput)?;
            Ok(Plan::new(voucher.clone()).op(Operation::VoucherCreate(VoucherCreateOp { voucher })))
        })
    }

    pub fn deactivate_voucher(&self, code: &str) -> Result<(), LedgerError> {
        let code = parse_code(code)?;
        self.execute("deactivate_voucher", |state, _now| {
            let voucher = state
                .voucher(&code)
                .ok_or_else(|| LedgerError::not_found("voucher", &code))?;
            if !voucher.is_active {
                return Ok(Plan::new(()));
            }
            Ok(Plan::new(()).op(Operation::VoucherDeactivate(VoucherDeactivateOp {
                code: code.clone(),
            })))
        })
    }

    pub fn voucher(&self, code: &str) -> Result<Voucher, LedgerError> {
        let code = parse_code(code)?;
        self.read(|state| {
            state
                .voucher(&code)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("voucher", &code))
        })
    }

    /// All vouchers sorted by code
    pub fn vouchers(&self) -> Vec<Voucher> {
        self.read(|state| state.vouchers().into_iter().cloned().collect())
    }
}

#[cfg(test)]
#[path = "catalogue_tests.rs"]
mod tests;
