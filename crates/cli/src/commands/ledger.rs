// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger audit commands

use super::{when, LiveEngine};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_core::{AccountId, LedgerEntry, LedgerEntryId, LedgerQuery, LedgerType, Page, Status};

#[derive(Args)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommand,
}

#[derive(Subcommand)]
pub enum LedgerCommand {
    /// Filter and page through entries in commit order
    Query {
        #[arg(long)]
        account: Option<String>,
        /// e.g. coin_purchase, admin_grant
        #[arg(long = "type")]
        entry_type: Option<LedgerType>,
        #[arg(long)]
        status: Option<Status>,
        /// Inclusive lower bound, RFC 3339
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Exclusive upper bound, RFC 3339
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = LedgerQuery::DEFAULT_PER_PAGE)]
        per_page: u32,
    },
    /// Show one entry
    Show { id: String },
}

#[derive(Serialize)]
struct EntryInfo(LedgerEntry);

impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.0;
        let delta = e.coin_delta();
        let coins = if delta == 0 {
            String::new()
        } else {
            format!("{:+}", delta)
        };
        write!(
            f,
            "{} {:<38} {:<24} {:<10} {:>7} {}",
            when(e.created_at),
            e.id.to_string(),
            e.entry_type.to_string(),
            e.status.to_string(),
            coins,
            e.description
        )
    }
}

#[derive(Serialize)]
struct PageInfo(Page<LedgerEntry>);

impl fmt::Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = &self.0;
        for entry in &page.items {
            writeln!(f, "{}", EntryInfo(entry.clone()))?;
        }
        write!(
            f,
            "page {} of {} ({} entries)",
            page.page,
            page.total_pages().max(1),
            page.total
        )
    }
}

pub fn handle(command: LedgerCommand, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    match command {
        LedgerCommand::Query {
            account,
            entry_type,
            status,
            from,
            until,
            page,
            per_page,
        } => {
            let query = LedgerQuery {
                account: account.map(AccountId::new),
                entry_type,
                status,
                from,
                until,
                page,
                per_page,
            };
            output::print(&PageInfo(engine.query(&query)), format);
        }
        LedgerCommand::Show { id } => {
            let entry = engine.entry(&LedgerEntryId::new(id))?;
            output::print(&EntryInfo(entry), format);
        }
    }
    Ok(())
}
