// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway purchase commands

use super::{when, LiveEngine};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_core::{AccountId, PackageId, PaymentMethod, Purchase, PurchaseDetails, PurchaseId};

#[derive(Args)]
pub struct PurchaseArgs {
    #[command(subcommand)]
    pub command: PurchaseCommand,
}

#[derive(Subcommand)]
pub enum PurchaseCommand {
    /// Start a purchase awaiting gateway confirmation
    Create {
        #[arg(long)]
        account: String,
        #[arg(long)]
        package: String,
        /// paypal or cryptomus
        #[arg(long, default_value = "paypal")]
        method: PaymentMethod,
        /// Voucher code (membership packages only)
        #[arg(long)]
        voucher: Option<String>,
    },
    /// Gateway reported success: deliver coins or membership
    Confirm {
        id: String,
        /// Gateway transaction reference
        #[arg(long = "ref")]
        reference: String,
    },
    /// Gateway reported failure
    Fail { id: String },
    /// Customer abandoned the checkout
    Cancel { id: String },
    /// Mark a completed purchase refunded
    Refund { id: String },
    /// Show one purchase
    Show { id: String },
    /// List an account's purchases
    List {
        #[arg(long)]
        account: String,
    },
}

#[derive(Serialize)]
struct PurchaseInfo(Purchase);

impl PurchaseInfo {
    fn delivers(&self) -> String {
        match &self.0.details {
            PurchaseDetails::Coins { coins } => format!("{} coins", coins),
            PurchaseDetails::Membership {
                tier,
                duration_days,
                ..
            } => format!("{} {}d", tier, duration_days),
        }
    }
}

impl fmt::Display for PurchaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.0;
        if !f.alternate() {
            return write!(
                f,
                "{:<38} {:<10} {:<14} {:>9} {}",
                p.id.to_string(),
                p.status.to_string(),
                self.delivers(),
                p.price.to_string(),
                when(p.created_at)
            );
        }
        writeln!(f, "Purchase: {}", p.id)?;
        writeln!(f, "  Account: {}", p.account)?;
        writeln!(f, "  Package: {} ({})", p.package, self.delivers())?;
        writeln!(f, "  Status: {}", p.status)?;
        write!(f, "  Price: {}", p.price)?;
        if let Some(voucher) = &p.voucher {
            write!(
                f,
                " (was {}, voucher {} -{})",
                p.original_price, voucher.code, voucher.discount
            )?;
        }
        write!(f, "\n  Method: {}", p.payment_method)?;
        if let Some(reference) = &p.transaction_id {
            write!(f, "\n  Gateway ref: {}", reference)?;
        }
        if let PurchaseDetails::Membership {
            starts_at: Some(starts_at),
            expires_at: Some(expires_at),
            ..
        } = &p.details
        {
            write!(f, "\n  Period: {} to {}", when(*starts_at), when(*expires_at))?;
        }
        if let Some(entry) = &p.ledger_entry {
            write!(f, "\n  Ledger entry: {}", entry)?;
        }
        Ok(())
    }
}

/// Detailed view for single purchases
struct Detailed(PurchaseInfo);

impl fmt::Display for Detailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl Serialize for Detailed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

pub fn handle(command: PurchaseCommand, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    let purchase = match command {
        PurchaseCommand::Create {
            account,
            package,
            method,
            voucher,
        } => engine.create_purchase(
            &AccountId::new(account),
            &PackageId::new(package),
            method,
            voucher.as_deref(),
        )?,
        PurchaseCommand::Confirm { id, reference } => {
            engine.confirm_purchase(&PurchaseId::new(id), &reference)?
        }
        PurchaseCommand::Fail { id } => engine.fail_purchase(&PurchaseId::new(id))?,
        PurchaseCommand::Cancel { id } => engine.cancel_purchase(&PurchaseId::new(id))?,
        PurchaseCommand::Refund { id } => engine.refund_purchase(&PurchaseId::new(id))?,
        PurchaseCommand::Show { id } => engine.purchase(&PurchaseId::new(id))?,
        PurchaseCommand::List { account } => {
            let purchases: Vec<PurchaseInfo> = engine
                .purchases_for(&AccountId::new(account))?
                .into_iter()
                .map(PurchaseInfo)
                .collect();
            output::print_list(&purchases, format, "No purchases");
            return Ok(());
        }
    };
    output::print(&Detailed(PurchaseInfo(purchase)), format);
    Ok(())
}
