// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events emitted after a commit succeeds
//!
//! Events are delivered to notification adapters (e.g. the "welcome to
//! premium" message after a grant). They are derived from committed state and
//! are never the source of truth.

use crate::account::{ActivationKind, Tier};
use crate::id::{AccountId, LedgerEntryId, PurchaseId};
use crate::item::ItemRef;
use crate::status::Status;
use crate::voucher::VoucherCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    CoinsCredited {
        account: AccountId,
        amount: u64,
        balance: u64,
        entry: LedgerEntryId,
    },
    CoinsDebited {
        account: AccountId,
        amount: u64,
        balance: u64,
        entry: LedgerEntryId,
    },
    MembershipActivated {
        account: AccountId,
        tier: Tier,
        kind: ActivationKind,
        expires_at: DateTime<Utc>,
        entry: LedgerEntryId,
    },
    MembershipExpired {
        account: AccountId,
        tier: Tier,
        entry: LedgerEntryId,
    },
    PurchaseCreated {
        purchase: PurchaseId,
        account: AccountId,
    },
    PurchaseTransitioned {
        purchase: PurchaseId,
        account: AccountId,
        from: Status,
        to: Status,
    },
    VoucherRedeemed {
        code: VoucherCode,
        account: AccountId,
        discount: u64,
    },
    ItemUnlocked {
        account: AccountId,
        item: ItemRef,
        entry: LedgerEntryId,
    },
}

impl Event {
    /// Event name in `noun:verb` form, used for routing and log fields
    pub fn name(&self) -> String {
        match self {
            Event::CoinsCredited { .. } => "wallet:credited".to_string(),
            Event::CoinsDebited { .. } => "wallet:debited".to_string(),
            Event::MembershipActivated {
                kind: ActivationKind::Activated,
                ..
            } => "membership:activated".to_string(),
            Event::MembershipActivated {
                kind: ActivationKind::Extended,
                ..
            } => "membership:extended".to_string(),
            Event::MembershipExpired { .. } => "membership:expired".to_string(),
            Event::PurchaseCreated { .. } => "purchase:created".to_string(),
            Event::PurchaseTransitioned { to, .. } => format!("purchase:{}", to),
            Event::VoucherRedeemed { .. } => "voucher:redeemed".to_string(),
            Event::ItemUnlocked { .. } => "item:unlocked".to_string(),
        }
    }

    /// The account the event concerns
    pub fn account(&self) -> &AccountId {
        match self {
            Event::CoinsCredited { account, .. }
            | Event::CoinsDebited { account, .. }
            | Event::MembershipActivated { account, .. }
            | Event::MembershipExpired { account, .. }
            | Event::PurchaseCreated { account, .. }
            | Event::PurchaseTransitioned { account, .. }
            | Event::VoucherRedeemed { account, .. }
            | Event::ItemUnlocked { account, .. } => account,
        }
    }
}
