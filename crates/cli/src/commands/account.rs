// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account commands

use super::{when, LiveEngine};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_core::{Account, AccountId, ItemRef, Tier};

#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Open an account with an empty wallet
    Create {
        /// Display name
        name: String,
    },
    /// Show balance, membership and unlocked items
    Show {
        /// Account ID
        id: String,
    },
    /// List all accounts
    List,
}

#[derive(Serialize)]
struct AccountInfo {
    id: AccountId,
    name: String,
    coin_balance: u64,
    tier: Tier,
    expires_at: Option<DateTime<Utc>>,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlocks: Option<Vec<ItemRef>>,
}

impl AccountInfo {
    fn new(account: Account, now: DateTime<Utc>) -> Self {
        Self {
            active: account.is_active(now),
            id: account.id,
            name: account.name,
            coin_balance: account.coin_balance,
            tier: account.membership.tier,
            expires_at: account.membership.expires_at,
            unlocks: None,
        }
    }

    fn membership(&self) -> String {
        match (self.active, self.expires_at) {
            (true, Some(expires_at)) => format!("{} until {}", self.tier, when(expires_at)),
            (false, Some(expires_at)) if self.tier.is_paid() => {
                format!("{} (lapsed {})", self.tier, when(expires_at))
            }
            _ => Tier::Free.to_string(),
        }
    }
}

impl fmt::Display for AccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(unlocks) = &self.unlocks else {
            return write!(
                f,
                "{:<38} {:<20} coins={:<8} {}",
                self.id.to_string(),
                self.name,
                self.coin_balance,
                self.membership()
            );
        };
        writeln!(f, "Account: {}", self.id)?;
        writeln!(f, "  Name: {}", self.name)?;
        writeln!(f, "  Coins: {}", self.coin_balance)?;
        write!(f, "  Membership: {}", self.membership())?;
        if !unlocks.is_empty() {
            let items: Vec<String> = unlocks.iter().map(ToString::to_string).collect();
            write!(f, "\n  Unlocked: {}", items.join(", "))?;
        }
        Ok(())
    }
}

pub fn handle(command: AccountCommand, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    let now = engine.now();
    match command {
        AccountCommand::Create { name } => {
            let account = engine.create_account(&name)?;
            match format {
                OutputFormat::Text => println!("Created account {}", account.id),
                OutputFormat::Json => output::print(&AccountInfo::new(account, now), format),
            }
        }
        AccountCommand::Show { id } => {
            let id = AccountId::new(id);
            let account = engine.account(&id)?;
            let mut info = AccountInfo::new(account, now);
            info.unlocks = Some(engine.unlocks(&id)?);
            output::print(&info, format);
        }
        AccountCommand::List => {
            let accounts: Vec<AccountInfo> = engine
                .accounts()
                .into_iter()
                .map(|account| AccountInfo::new(account, now))
                .collect();
            output::print_list(&accounts, format, "No accounts");
        }
    }
    Ok(())
}
