// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content gating check

use super::LiveEngine;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt;
use tally_core::{AccountId, ItemRef};

#[derive(Args)]
pub struct EntitledArgs {
    #[arg(long)]
    pub account: String,
    /// ebook:<id> or chapter:<id>; an unlocked item is always readable
    #[arg(long)]
    pub item: Option<ItemRef>,
    /// Content is reserved for active premium members
    #[arg(long)]
    pub premium: bool,
    /// Coin price of the content; 0 means free
    #[arg(long, default_value = "0")]
    pub price: u64,
}

#[derive(Serialize)]
struct Verdict {
    account: AccountId,
    entitled: bool,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.entitled { "entitled" } else { "not entitled" };
        write!(f, "{} is {}", self.account, verdict)
    }
}

pub fn handle(args: EntitledArgs, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    let account = AccountId::new(args.account);
    let entitled = engine.is_entitled(&account, args.premium, args.price, args.item.as_ref())?;
    output::print(&Verdict { account, entitled }, format);
    Ok(())
}
