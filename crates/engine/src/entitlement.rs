// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Membership entitlements
//!
//! Access decisions read [`Account::is_active`] directly, so a lapsed
//! premium account is denied whether or not it has been swept yet.

use crate::engine::{Engine, Plan};
use crate::error::LedgerError;
use crate::lookup;
use crate::notify::NotifyAdapter;
use chrono::{DateTime, Utc};
use tally_core::{
    Account, AccountId, Activation, Clock, Event, IdGen, LedgerEntry, LedgerEntryId, LedgerType,
    MembershipWindow, PaymentMethod, Tier,
};
use tally_storage::{LedgerAppendOp, MembershipExpireOp, MembershipSetOp, Operation};

/// A planned membership period
pub(crate) struct Grant {
    pub op: Operation,
    pub event: Event,
    pub activation: Activation,
    pub window: MembershipWindow,
}

pub(crate) fn activate(
    account: &Account,
    tier: Tier,
    days: u32,
    entry: &LedgerEntryId,
    now: DateTime<Utc>,
) -> Result<Grant, LedgerError> {
    if !tier.is_paid() {
        return Err(LedgerError::invalid(format!("cannot activate the {} tier", tier)));
    }
    if days == 0 {
        return Err(LedgerError::invalid("membership must last at least one day"));
    }

    let activation = account.membership.activate(tier, days, now);
    let expires_at = activation
        .membership
        .expires_at
        .ok_or_else(|| LedgerError::invalid("activation produced no expiry"))?;

    Ok(Grant {
        op: Operation::MembershipSet(MembershipSetOp {
            account: account.id.clone(),
            tier,
            expires_at,
            expected_version: account.version,
        }),
        event: Event::MembershipActivated {
            account: account.id.clone(),
            tier,
            kind: activation.kind,
            expires_at,
            entry: entry.clone(),
        },
        window: MembershipWindow {
            tier,
            days,
            starts_at: activation.starts_at,
            expires_at,
        },
        activation,
    })
}

/// A planned reset to the free tier
pub(crate) struct Lapse {
    pub op: Operation,
    pub entry: LedgerEntry,
    pub event: Event,
}

impl Lapse {
    pub fn plan(self) -> Plan<bool> {
        Plan::new(true)
            .op(self.op)
            .op(Operation::LedgerAppend(LedgerAppendOp { entry: self.entry }))
            .event(self.event)
    }
}

/// Reset a paid account to free, recorded by a `membership_expiry` ledger
/// entry; `None` when there is nothing to expire
pub(crate) fn expire(account: &Account, entry: LedgerEntryId, now: DateTime<Utc>) -> Option<Lapse> {
    let tier = account.membership.tier;
    if !tier.is_paid() {
        return None;
    }
    Some(Lapse {
        op: Operation::MembershipExpire(MembershipExpireOp {
            account: account.id.clone(),
            expected_version: account.version,
            at: now,
        }),
        entry: LedgerEntry::new(
            entry.clone(),
            account.id.clone(),
            LedgerType::MembershipExpiry,
            PaymentMethod::System,
            format!("{} membership expired", tier),
            now,
        ),
        event: Event::MembershipExpired {
            account: account.id.clone(),
            tier,
            entry,
        },
    })
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    /// Start or extend a membership, recorded by `entry`.
    ///
    /// An active membership of the same tier is extended from its current
    /// expiry; anything else starts a fresh period from now.
    pub fn activate(
        &self,
        account: &AccountId,
        tier: Tier,
        days: u32,
        entry: LedgerEntry,
    ) -> Result<Activation, LedgerError> {
        if entry.account != *account {
            return Err(LedgerError::invalid(format!(
                "ledger entry {} belongs to account {}",
                entry.id, entry.account
            )));
        }
        let locks = self.locks(account, None);
        let _held = locks.hold();

        self.execute("activate", |state, now| {
            let grant = activate(lookup::account(state, account)?, tier, days, &entry.id, now)?;
            let entry = entry.clone().with_membership(grant.window);
            Ok(Plan::new(grant.activation)
                .op(grant.op)
                .op(Operation::LedgerAppend(LedgerAppendOp { entry }))
                .event(grant.event))
        })
    }

    /// Whether the account's membership is in force right now
    pub fn is_active(&self, account: &AccountId) -> Result<bool, LedgerError> {
        let now = self.now();
        self.read(|state| lookup::account(state, account).map(|a| a.is_active(now)))
    }

    /// Drop the account back to the free tier. Returns false if it already was.
    ///
    /// The reset is recorded as a `membership_expiry` ledger entry.
    pub fn expire(&self, account: &AccountId) -> Result<bool, LedgerError> {
        let locks = self.locks(account, None);
        let _held = locks.hold();

        self.execute("expire", |state, now| {
            let current = lookup::account(state, account)?;
            let entry = LedgerEntryId::generate(self.ids());
            Ok(match expire(current, entry, now) {
                Some(lapse) => lapse.plan(),
                None => Plan::new(false),
            })
        })
    }
}

#[cfg(test)]
#[path = "entitlement_tests.rs"]
mod tests;
