// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accounts and their two monetizable facets: coin balance and membership
//!
//! Membership expiry is only ever trusted through [`Membership::is_active`],
//! which also checks the tier. A premium tier with a past expiry is already
//! inactive, whether or not the sweeper has normalized it yet.

use crate::id::AccountId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Membership tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl Tier {
    /// Tiers that can be purchased or granted
    pub fn is_paid(self) -> bool {
        !matches!(self, Tier::Free)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// How a membership purchase or grant was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    /// A fresh period starting now
    Activated,
    /// Duration appended to a currently active period of the same tier
    Extended,
}

/// Result of applying a membership period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub membership: Membership,
    pub kind: ActivationKind,
    /// Start of the newly purchased window
    pub starts_at: DateTime<Utc>,
}

/// Membership facet of an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub tier: Tier,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Membership {
    pub fn free() -> Self {
        Self::default()
    }

    /// Premium with an expiry strictly in the future
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.tier.is_paid() && self.expires_at.is_some_and(|expires_at| expires_at > now)
    }

    /// Stored as paid but no longer active (what the sweeper normalizes)
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.tier.is_paid() && !self.is_active(now)
    }

    /// Apply a period of `tier` lasting `duration_days`.
    ///
    /// Extends from the current expiry when already active on the same tier,
    /// otherwise starts a fresh period from `now`. Switching tiers discards the
    /// time left on the previous tier.
    pub fn activate(&self, tier: Tier, duration_days: u32, now: DateTime<Utc>) -> Activation {
        let duration = Duration::days(i64::from(duration_days));
        match self.expires_at {
            Some(expires_at) if self.is_active(now) && self.tier == tier => {
                let anchor = expires_at.max(now);
                Activation {
                    membership: Membership {
                        tier,
                        expires_at: Some(anchor + duration),
                    },
                    kind: ActivationKind::Extended,
                    starts_at: anchor,
                }
            }
            _ => Activation {
                membership: Membership {
                    tier,
                    expires_at: Some(now + duration),
                },
                kind: ActivationKind::Activated,
                starts_at: now,
            },
        }
    }
}

/// Debit larger than the available balance
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("insufficient coins: balance {balance}, required {required}")]
pub struct InsufficientFunds {
    pub balance: u64,
    pub required: u64,
}

/// An account with its wallet and membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub coin_balance: u64,
    pub membership: Membership,
    /// Bumped on every balance or membership change; used for optimistic commits
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            coin_balance: 0,
            membership: Membership::free(),
            version: 0,
            created_at,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.membership.is_active(now)
    }

    /// Balance after debiting `amount`, or the shortfall
    pub fn balance_after_debit(&self, amount: u64) -> Result<u64, InsufficientFunds> {
        self.coin_balance
            .checked_sub(amount)
            .ok_or(InsufficientFunds {
                balance: self.coin_balance,
                required: amount,
            })
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
