// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Voucher rules and discount arithmetic
//!
//! A voucher's `usage_count` is only maintained for globally limited vouchers.
//! Per-user usage is always counted from the redemption log.

use crate::id::{AccountId, LedgerEntryId, PurchaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Voucher code, normalized to trimmed upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoucherCode(String);

impl VoucherCode {
    /// Normalize a user-entered code; `None` if it cannot be a voucher code
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        let valid = !code.is_empty()
            && code.len() <= 64
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then_some(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoucherCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which purchases a voucher may discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    Membership,
    Ebook,
    Hybrid,
}

/// What a redemption was used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherPurpose {
    Membership,
    Ebook,
}

impl VoucherType {
    pub fn applies_to(self, purpose: VoucherPurpose) -> bool {
        matches!(
            (self, purpose),
            (VoucherType::Hybrid, _)
                | (VoucherType::Membership, VoucherPurpose::Membership)
                | (VoucherType::Ebook, VoucherPurpose::Ebook)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percent,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLimitType {
    PerUser,
    Global,
}

macro_rules! snake_enum_str {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($ty), other)),
                }
            }
        }
    };
}

snake_enum_str!(VoucherType { Membership => "membership", Ebook => "ebook", Hybrid => "hybrid" });
snake_enum_str!(VoucherPurpose { Membership => "membership", Ebook => "ebook" });
snake_enum_str!(DiscountType { Percent => "percent", Flat => "flat" });
snake_enum_str!(UsageLimitType { PerUser => "per_user", Global => "global" });

/// Why a voucher cannot be applied. The messages are shown to customers as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoucherRejection {
    #[error("voucher code not found")]
    NotFound,
    #[error("this voucher is no longer active")]
    Inactive,
    #[error("this voucher has expired")]
    Expired,
    #[error("this voucher cannot be used for {purpose} purchases")]
    WrongType { purpose: VoucherPurpose },
    #[error("this voucher has reached its usage limit")]
    LimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub code: VoucherCode,
    pub voucher_type: VoucherType,
    pub discount_type: DiscountType,
    /// Percent (0-100) or a flat amount in the purchase's own unit
    pub discount_value: u64,
    pub usage_limit_type: UsageLimitType,
    pub usage_limit: u32,
    /// Redemptions so far; only meaningful for global limits
    pub usage_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// How much of a voucher's limit is already taken, as seen by one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoucherUses {
    /// Redemption log rows for this account
    pub user: u32,
    /// Slots held by pending purchases, across all accounts
    pub held: u32,
    /// Slots held by this account's pending purchases
    pub user_held: u32,
}

impl VoucherUses {
    pub fn redeemed(user: u32) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }
}

impl Voucher {
    /// Run the redemption checks in order, stopping at the first failure.
    ///
    /// A pending purchase priced with the voucher holds one slot of its
    /// limit until it settles, so held slots count as used.
    pub fn check(
        &self,
        purpose: VoucherPurpose,
        uses: VoucherUses,
        now: DateTime<Utc>,
    ) -> Result<(), VoucherRejection> {
        if !self.is_active {
            return Err(VoucherRejection::Inactive);
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(VoucherRejection::Expired);
        }
        if !self.voucher_type.applies_to(purpose) {
            return Err(VoucherRejection::WrongType { purpose });
        }
        let used = match self.usage_limit_type {
            UsageLimitType::Global => self.usage_count.saturating_add(uses.held),
            UsageLimitType::PerUser => uses.user.saturating_add(uses.user_held),
        };
        if used >= self.usage_limit {
            return Err(VoucherRejection::LimitReached);
        }
        Ok(())
    }

    /// Discount on `original_amount`, never more than the amount itself
    pub fn calculate_discount(&self, original_amount: u64) -> u64 {
        match self.discount_type {
            DiscountType::Percent => percent_discount(original_amount, self.discount_value),
            DiscountType::Flat => self.discount_value.min(original_amount),
        }
    }

    /// Check definition rules before the voucher is written
    pub fn validate(&self) -> Result<(), String> {
        if self.discount_value == 0 {
            return Err("discount value must be positive".to_string());
        }
        if self.discount_type == DiscountType::Percent && self.discount_value > 100 {
            return Err("percent discount cannot exceed 100".to_string());
        }
        if self.usage_limit == 0 {
            return Err("usage limit must be at least 1".to_string());
        }
        Ok(())
    }
}

/// `ceil(amount * percent / 100)`, in exact integer arithmetic.
///
/// Rounding up favours the customer; capped at `amount`.
pub fn percent_discount(amount: u64, percent: u64) -> u64 {
    let scaled = u128::from(amount) * u128::from(percent.min(100));
    let discount = scaled.div_ceil(100);
    u64::try_from(discount).unwrap_or(u64::MAX).min(amount)
}

/// One row of the redemption log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherUsage {
    pub code: VoucherCode,
    pub account: AccountId,
    pub used_for: VoucherPurpose,
    pub discount_amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase: Option<PurchaseId>,
    pub ledger_entry: LedgerEntryId,
    pub used_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "voucher_tests.rs"]
mod tests;
