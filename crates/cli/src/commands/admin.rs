// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator adjustments; each one writes an admin ledger entry

use super::{when, LiveEngine};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_core::{AccountId, ActivationKind, Tier};

#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Add coins to an account
    GrantCoins {
        account: String,
        amount: u64,
        /// Recorded on the ledger entry
        #[arg(long)]
        reason: String,
    },
    /// Remove coins from an account
    DeductCoins {
        account: String,
        amount: u64,
        #[arg(long)]
        reason: String,
    },
    /// Give membership time without a purchase
    GrantMembership {
        account: String,
        #[arg(long, default_value = "premium")]
        tier: Tier,
        #[arg(long)]
        days: u32,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Serialize)]
struct BalanceInfo {
    account: AccountId,
    balance: u64,
}

impl fmt::Display for BalanceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Balance of {}: {}", self.account, self.balance)
    }
}

#[derive(Serialize)]
struct MembershipInfo {
    account: AccountId,
    tier: Tier,
    kind: ActivationKind,
    starts_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl fmt::Display for MembershipInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            ActivationKind::Activated => "Activated",
            ActivationKind::Extended => "Extended",
        };
        write!(f, "{} {} for {}", verb, self.tier, self.account)?;
        if let Some(expires_at) = self.expires_at {
            write!(f, " until {}", when(expires_at))?;
        }
        Ok(())
    }
}

pub fn handle(command: AdminCommand, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    match command {
        AdminCommand::GrantCoins {
            account,
            amount,
            reason,
        } => {
            let account = AccountId::new(account);
            let balance = engine.grant_coins(&account, amount, &reason)?;
            output::print(&BalanceInfo { account, balance }, format);
        }
        AdminCommand::DeductCoins {
            account,
            amount,
            reason,
        } => {
            let account = AccountId::new(account);
            let balance = engine.deduct_coins(&account, amount, &reason)?;
            output::print(&BalanceInfo { account, balance }, format);
        }
        AdminCommand::GrantMembership {
            account,
            tier,
            days,
            reason,
        } => {
            let account = AccountId::new(account);
            let activation = engine.grant_membership(&account, tier, days, &reason)?;
            let info = MembershipInfo {
                account,
                tier: activation.membership.tier,
                kind: activation.kind,
                starts_at: activation.starts_at,
                expires_at: activation.membership.expires_at,
            };
            output::print(&info, format);
        }
    }
    Ok(())
}
