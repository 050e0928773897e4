// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Purchase records for coin top-ups and memberships
//!
//! A purchase is created `pending` and only completes when the payment
//! collaborator confirms it. Completing a membership purchase is what
//! activates or extends the account's membership.

use crate::account::Tier;
use crate::id::{AccountId, LedgerEntryId, PackageId, PurchaseId};
use crate::ledger::LedgerType;
use crate::money::UsdCents;
use crate::status::{Status, TransitionError};
use crate::voucher::VoucherCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a purchase or ledger entry was paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Paypal,
    Cryptomus,
    Coins,
    Admin,
    /// Bookkeeping done by the ledger itself, such as membership expiry
    System,
}

impl PaymentMethod {
    /// Settled by an outside gateway (purchase waits for confirmation)
    pub fn is_external(self) -> bool {
        matches!(self, PaymentMethod::Paypal | PaymentMethod::Cryptomus)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Cryptomus => "cryptomus",
            PaymentMethod::Coins => "coins",
            PaymentMethod::Admin => "admin",
            PaymentMethod::System => "system",
        };
        f.write_str(name)
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paypal" => Ok(PaymentMethod::Paypal),
            "cryptomus" => Ok(PaymentMethod::Cryptomus),
            "coins" => Ok(PaymentMethod::Coins),
            "admin" => Ok(PaymentMethod::Admin),
            "system" => Ok(PaymentMethod::System),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// What the purchase delivers once completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseDetails {
    Coins {
        coins: u64,
    },
    Membership {
        tier: Tier,
        duration_days: u32,
        /// Resolved when the purchase completes
        #[serde(default, skip_serializing_if = "Option::is_none")]
        starts_at: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
    },
}

/// A voucher discount locked in when the purchase was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedVoucher {
    pub code: VoucherCode,
    pub discount: UsdCents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub account: AccountId,
    pub package: PackageId,
    pub details: PurchaseDetails,
    pub status: Status,
    /// Package price at the time of purchase
    pub original_price: UsdCents,
    /// Amount actually charged after any voucher
    pub price: UsdCents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher: Option<AppliedVoucher>,
    pub payment_method: PaymentMethod,
    /// Gateway reference supplied on confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_entry: Option<LedgerEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn is_membership(&self) -> bool {
        matches!(self.details, PurchaseDetails::Membership { .. })
    }

    pub fn ledger_type(&self) -> LedgerType {
        match self.details {
            PurchaseDetails::Coins { .. } => LedgerType::CoinPurchase,
            PurchaseDetails::Membership { .. } => LedgerType::MembershipPurchase,
        }
    }

    /// Pure status transition; the caller persists the result
    pub fn transition(&self, to: Status, now: DateTime<Utc>) -> Result<Purchase, TransitionError> {
        let status = self.status.transition(to)?;
        Ok(Purchase {
            status,
            updated_at: now,
            ..self.clone()
        })
    }
}

#[cfg(test)]
#[path = "purchase_tests.rs"]
mod tests;
