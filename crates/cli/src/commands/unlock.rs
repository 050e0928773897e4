// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coin-funded unlocks

use super::LiveEngine;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt;
use tally_core::{AccountId, ItemRef};
use tally_engine::UnlockReceipt;

#[derive(Args)]
pub struct UnlockArgs {
    #[arg(long)]
    pub account: String,
    /// ebook:<id> or chapter:<id>
    pub item: ItemRef,
    /// Catalogue price in coins
    #[arg(long)]
    pub price: u64,
    /// Voucher code (ebooks only)
    #[arg(long)]
    pub voucher: Option<String>,
}

#[derive(Serialize)]
struct ReceiptInfo(UnlockReceipt);

impl fmt::Display for ReceiptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        write!(f, "Unlocked {} for {} coins", r.item, r.price_paid)?;
        if r.discount > 0 {
            write!(f, " ({} off)", r.discount)?;
        }
        write!(f, "; balance {}", r.balance)
    }
}

pub fn handle(args: UnlockArgs, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    let receipt = engine.unlock_item(
        &AccountId::new(args.account),
        &args.item,
        args.price,
        args.voucher.as_deref(),
    )?;
    output::print(&ReceiptInfo(receipt), format);
    Ok(())
}
