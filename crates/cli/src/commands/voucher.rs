// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Voucher commands

use super::{when, LiveEngine};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_core::{
    AccountId, DiscountType, UsageLimitType, Voucher, VoucherPurpose, VoucherType, VoucherUsage,
};
use tally_engine::{NewVoucher, Quote, UsageDrift};

#[derive(Args)]
pub struct VoucherArgs {
    #[command(subcommand)]
    pub command: VoucherCommand,
}

#[derive(Subcommand)]
pub enum VoucherCommand {
    /// Define a voucher
    Create {
        /// Code customers type in (case-insensitive)
        code: String,
        /// membership, ebook or hybrid
        #[arg(long = "type")]
        voucher_type: VoucherType,
        /// percent or flat
        #[arg(long)]
        discount: DiscountType,
        /// Percent (1-100) or flat amount
        #[arg(long)]
        value: u64,
        /// per_user or global
        #[arg(long, default_value = "per_user")]
        limit_type: UsageLimitType,
        #[arg(long, default_value = "1")]
        limit: u32,
        /// Expiry as RFC 3339, e.g. 2026-12-31T23:59:59Z
        #[arg(long)]
        expires: Option<DateTime<Utc>>,
    },
    /// Stop accepting a voucher
    Deactivate { code: String },
    /// Check a voucher for an account and optionally price a purchase
    Validate {
        code: String,
        #[arg(long)]
        account: String,
        /// membership or ebook
        #[arg(long = "for")]
        purpose: VoucherPurpose,
        /// Amount to quote the discount against
        #[arg(long)]
        amount: Option<u64>,
    },
    /// List vouchers
    List,
    /// Show redemptions of one voucher
    Usages { code: String },
    /// Compare cached global usage counters with the redemption log
    Audit,
}

#[derive(Serialize)]
struct VoucherInfo(Voucher);

impl fmt::Display for VoucherInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.0;
        let discount = match v.discount_type {
            DiscountType::Percent => format!("{}%", v.discount_value),
            DiscountType::Flat => format!("-{}", v.discount_value),
        };
        let usage = match v.usage_limit_type {
            UsageLimitType::Global => format!("{}/{} global", v.usage_count, v.usage_limit),
            UsageLimitType::PerUser => format!("{} per user", v.usage_limit),
        };
        write!(
            f,
            "{:<16} {:<10} {:<6} {:<14}",
            v.code.to_string(),
            v.voucher_type.to_string(),
            discount,
            usage
        )?;
        if let Some(expires_at) = v.expires_at {
            write!(f, " expires {}", when(expires_at))?;
        }
        if !v.is_active {
            write!(f, " [inactive]")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct QuoteInfo {
    valid: bool,
    #[serde(flatten)]
    quote: Option<Quote>,
}

impl fmt::Display for QuoteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quote {
            Some(q) => write!(
                f,
                "Voucher {} is valid: {} - {} = {}",
                q.code, q.original, q.discount, q.final_amount
            ),
            None => write!(f, "Voucher is valid"),
        }
    }
}

#[derive(Serialize)]
struct UsageInfo(VoucherUsage);

impl fmt::Display for UsageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = &self.0;
        write!(
            f,
            "{:<38} {:<10} -{:<6} {:<38} {}",
            u.account.to_string(),
            u.used_for.to_string(),
            u.discount_amount,
            u.ledger_entry.to_string(),
            when(u.used_at)
        )
    }
}

#[derive(Serialize)]
struct DriftInfo(UsageDrift);

impl fmt::Display for DriftInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} cached={} actual={}",
            self.0.code.to_string(),
            self.0.cached,
            self.0.actual
        )
    }
}

pub fn handle(command: VoucherCommand, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    match command {
        VoucherCommand::Create {
            code,
            voucher_type,
            discount,
            value,
            limit_type,
            limit,
            expires,
        } => {
            let voucher = engine.create_voucher(NewVoucher {
                code,
                voucher_type,
                discount_type: discount,
                discount_value: value,
                usage_limit_type: limit_type,
                usage_limit: limit,
                expires_at: expires,
            })?;
            match format {
                OutputFormat::Text => println!("Created voucher {}", voucher.code),
                OutputFormat::Json => output::print(&VoucherInfo(voucher), format),
            }
        }
        VoucherCommand::Deactivate { code } => {
            engine.deactivate_voucher(&code)?;
            let voucher = engine.voucher(&code)?;
            match format {
                OutputFormat::Text => println!("Deactivated voucher {}", voucher.code),
                OutputFormat::Json => output::print(&VoucherInfo(voucher), format),
            }
        }
        VoucherCommand::Validate {
            code,
            account,
            purpose,
            amount,
        } => {
            let account = AccountId::new(account);
            let quote = match amount {
                Some(amount) => Some(engine.quote(&code, &account, purpose, amount)?),
                None => {
                    engine.validate_voucher(&code, &account, purpose)?;
                    None
                }
            };
            output::print(&QuoteInfo { valid: true, quote }, format);
        }
        VoucherCommand::List => {
            let vouchers: Vec<VoucherInfo> = engine.vouchers().into_iter().map(VoucherInfo).collect();
            output::print_list(&vouchers, format, "No vouchers");
        }
        VoucherCommand::Usages { code } => {
            let usages: Vec<UsageInfo> = engine
                .voucher_usages(&code)?
                .into_iter()
                .map(UsageInfo)
                .collect();
            output::print_list(&usages, format, "No redemptions");
        }
        VoucherCommand::Audit => {
            let drift: Vec<DriftInfo> = engine.audit_usage().into_iter().map(DriftInfo).collect();
            output::print_list(&drift, format, "Usage counters match the redemption log");
        }
    }
    Ok(())
}
