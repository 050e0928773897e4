// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tally - wallet & entitlement ledger CLI

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod commands;
mod config;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{account, admin, entitled, ledger, package, purchase, sweep, unlock, voucher, wal};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::Config;
use crate::error::TallyError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Tally - coin wallets, memberships and vouchers for the ebook store"
)]
struct Cli {
    /// Directory holding the WAL and snapshots
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to TALLY_CONFIG, then ./tally.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management
    Account(account::AccountArgs),
    /// Catalogue packages
    Package(package::PackageArgs),
    /// Voucher management
    Voucher(voucher::VoucherArgs),
    /// Gateway purchases
    Purchase(purchase::PurchaseArgs),
    /// Unlock an ebook or chapter with coins
    Unlock(unlock::UnlockArgs),
    /// Operator adjustments
    Admin(admin::AdminArgs),
    /// Audit the ledger
    Ledger(ledger::LedgerArgs),
    /// Downgrade lapsed memberships
    Sweep(sweep::SweepArgs),
    /// WAL maintenance
    Wal(wal::WalArgs),
    /// Check whether an account may read an item
    Entitled(entitled::EntitledArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", TallyError::from(err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let _guard = logging::setup_logging(&config)?;
    let format = cli.format;

    // WAL maintenance works on the files directly, without replaying them
    if let Commands::Wal(args) = cli.command {
        return wal::handle(args.command, &config, format);
    }

    let engine = commands::open_engine(&config)?;
    match cli.command {
        Commands::Account(args) => account::handle(args.command, &engine, format),
        Commands::Package(args) => package::handle(args.command, &engine, format),
        Commands::Voucher(args) => voucher::handle(args.command, &engine, format),
        Commands::Purchase(args) => purchase::handle(args.command, &engine, format),
        Commands::Unlock(args) => unlock::handle(args, &engine, format),
        Commands::Admin(args) => admin::handle(args.command, &engine, format),
        Commands::Ledger(args) => ledger::handle(args.command, &engine, format),
        Commands::Sweep(args) => sweep::handle(args, &engine, format).await,
        Commands::Entitled(args) => entitled::handle(args, &engine, format),
        Commands::Wal(_) => Ok(()),
    }
}
