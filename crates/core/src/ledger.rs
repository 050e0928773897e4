// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger entries and audit queries
//!
//! Entries are immutable once written except for `status`, which mirrors the
//! terminal status of the purchase that produced them.

use crate::account::Tier;
use crate::id::{AccountId, LedgerEntryId, PackageId, PurchaseId};
use crate::item::ItemRef;
use crate::money::UsdCents;
use crate::purchase::PaymentMethod;
use crate::status::Status;
use crate::voucher::VoucherCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerType {
    CoinPurchase,
    MembershipPurchase,
    EbookPurchase,
    ChapterPurchase,
    AdminGrant,
    AdminDeduction,
    AdminMembershipGrant,
    /// A lapsed membership dropped back to free; moves no money or coins
    MembershipExpiry,
}

impl LedgerType {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerType::CoinPurchase => "coin_purchase",
            LedgerType::MembershipPurchase => "membership_purchase",
            LedgerType::EbookPurchase => "ebook_purchase",
            LedgerType::ChapterPurchase => "chapter_purchase",
            LedgerType::AdminGrant => "admin_grant",
            LedgerType::AdminDeduction => "admin_deduction",
            LedgerType::AdminMembershipGrant => "admin_membership_grant",
            LedgerType::MembershipExpiry => "membership_expiry",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(
            self,
            LedgerType::AdminGrant | LedgerType::AdminDeduction | LedgerType::AdminMembershipGrant
        )
    }
}

impl fmt::Display for LedgerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            LedgerType::CoinPurchase,
            LedgerType::MembershipPurchase,
            LedgerType::EbookPurchase,
            LedgerType::ChapterPurchase,
            LedgerType::AdminGrant,
            LedgerType::AdminDeduction,
            LedgerType::AdminMembershipGrant,
            LedgerType::MembershipExpiry,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| format!("unknown ledger type: {}", s))
    }
}

/// Membership period recorded by a membership purchase or grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipWindow {
    pub tier: Tier,
    pub days: u32,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub account: AccountId,
    pub entry_type: LedgerType,
    /// Real money involved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<UsdCents>,
    #[serde(default)]
    pub coins_spent: u64,
    #[serde(default)]
    pub coins_received: u64,
    pub payment_method: PaymentMethod,
    pub status: Status,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase: Option<PurchaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher: Option<VoucherCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<MembershipWindow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// A completed entry with no amounts or references yet
    pub fn new(
        id: LedgerEntryId,
        account: AccountId,
        entry_type: LedgerType,
        payment_method: PaymentMethod,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account,
            entry_type,
            amount_usd: None,
            coins_spent: 0,
            coins_received: 0,
            payment_method,
            status: Status::Completed,
            description: description.into(),
            package: None,
            purchase: None,
            item: None,
            voucher: None,
            membership: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_usd(mut self, amount: UsdCents) -> Self {
        self.amount_usd = Some(amount);
        self
    }

    pub fn with_coins_spent(mut self, coins: u64) -> Self {
        self.coins_spent = coins;
        self
    }

    pub fn with_coins_received(mut self, coins: u64) -> Self {
        self.coins_received = coins;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_package(mut self, package: PackageId) -> Self {
        self.package = Some(package);
        self
    }

    pub fn with_purchase(mut self, purchase: PurchaseId) -> Self {
        self.purchase = Some(purchase);
        self
    }

    pub fn with_item(mut self, item: ItemRef) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_voucher(mut self, code: VoucherCode) -> Self {
        self.voucher = Some(code);
        self
    }

    pub fn with_membership(mut self, window: MembershipWindow) -> Self {
        self.membership = Some(window);
        self
    }

    /// Net coin movement: received minus spent
    pub fn coin_delta(&self) -> i128 {
        i128::from(self.coins_received) - i128::from(self.coins_spent)
    }
}

/// Filters for the audit/reporting view. Empty filters match everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub account: Option<AccountId>,
    pub entry_type: Option<LedgerType>,
    pub status: Option<Status>,
    /// Inclusive lower bound on `created_at`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub until: Option<DateTime<Utc>>,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
}

impl Default for LedgerQuery {
    fn default() -> Self {
        Self {
            account: None,
            entry_type: None,
            status: None,
            from: None,
            until: None,
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

impl LedgerQuery {
    pub const DEFAULT_PER_PAGE: u32 = 50;
    pub const MAX_PER_PAGE: u32 = 500;

    pub fn for_account(account: AccountId) -> Self {
        Self {
            account: Some(account),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, entry_type: LedgerType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.account.as_ref().map_or(true, |a| *a == entry.account)
            && self.entry_type.map_or(true, |t| t == entry.entry_type)
            && self.status.map_or(true, |s| s == entry.status)
            && self.from.map_or(true, |from| entry.created_at >= from)
            && self.until.map_or(true, |until| entry.created_at < until)
    }

    /// Page through `entries` (already in commit order)
    pub fn run<'a>(&self, entries: impl Iterator<Item = &'a LedgerEntry>) -> Page<LedgerEntry> {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        let skip = (page as usize - 1).saturating_mul(per_page as usize);

        let mut total = 0usize;
        let mut items = Vec::new();
        for entry in entries.filter(|e| self.matches(e)) {
            if total >= skip && items.len() < per_page as usize {
                items.push(entry.clone());
            }
            total += 1;
        }

        Page {
            items,
            page,
            per_page,
            total,
        }
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1) as usize)
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) < self.total_pages()
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
