// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalogue package commands

use super::LiveEngine;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt;
use tally_core::{MembershipPackage, Package, PackageFeature, PackageId, PackageKind, Tier, UsdCents};

#[derive(Args)]
pub struct PackageArgs {
    #[command(subcommand)]
    pub command: PackageCommand,
}

#[derive(Subcommand)]
pub enum PackageCommand {
    /// Add a coin package
    AddCoins {
        name: String,
        /// Coins granted on purchase
        #[arg(long)]
        coins: u64,
        /// Price in dollars, e.g. 4.99
        #[arg(long)]
        price: UsdCents,
    },
    /// Add a membership package
    AddMembership {
        name: String,
        #[arg(long, default_value = "premium")]
        tier: Tier,
        /// Length of one purchased period
        #[arg(long)]
        days: u32,
        /// Price in dollars, e.g. 9.99
        #[arg(long)]
        price: UsdCents,
        /// Strike-through price shown next to the real one
        #[arg(long)]
        was_price: Option<UsdCents>,
        /// Advertised perk (repeatable)
        #[arg(long = "feature")]
        features: Vec<PackageFeature>,
    },
    /// Retire a package; past purchases keep their price
    Deactivate {
        /// Package ID
        id: String,
    },
    /// List packages
    List {
        /// Include retired packages
        #[arg(long)]
        all: bool,
    },
}

#[derive(Serialize)]
struct PackageInfo {
    #[serde(flatten)]
    package: Package,
    #[serde(skip_serializing_if = "Option::is_none")]
    savings_percent: Option<u64>,
}

impl From<Package> for PackageInfo {
    fn from(package: Package) -> Self {
        let savings_percent = match &package.kind {
            PackageKind::Membership(membership) => membership.savings_percent(),
            PackageKind::Coins(_) => None,
        };
        Self {
            package,
            savings_percent,
        }
    }
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let package = &self.package;
        let what = match &package.kind {
            PackageKind::Coins(coins) => format!("{} coins", coins.coins),
            PackageKind::Membership(membership) => {
                format!("{} {}d", membership.tier, membership.duration_days)
            }
        };
        write!(
            f,
            "{:<38} {:<24} {:<14} {:>9}",
            package.id.to_string(),
            package.name,
            what,
            package.price().to_string()
        )?;
        if let Some(percent) = self.savings_percent {
            write!(f, " (save {}%)", percent)?;
        }
        if !package.active {
            write!(f, " [inactive]")?;
        }
        Ok(())
    }
}

pub fn handle(command: PackageCommand, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    match command {
        PackageCommand::AddCoins { name, coins, price } => {
            let package = engine.create_coin_package(&name, coins, price)?;
            created(package, format);
        }
        PackageCommand::AddMembership {
            name,
            tier,
            days,
            price,
            was_price,
            features,
        } => {
            let membership = MembershipPackage {
                tier,
                duration_days: days,
                price,
                was_price,
                features,
            };
            let package = engine.create_membership_package(&name, membership)?;
            created(package, format);
        }
        PackageCommand::Deactivate { id } => {
            let id = PackageId::new(id);
            engine.deactivate_package(&id)?;
            let package = engine.package(&id)?;
            match format {
                OutputFormat::Text => println!("Deactivated package {}", package.id),
                OutputFormat::Json => output::print(&PackageInfo::from(package), format),
            }
        }
        PackageCommand::List { all } => {
            let packages: Vec<PackageInfo> = engine
                .packages(!all)
                .into_iter()
                .map(PackageInfo::from)
                .collect();
            output::print_list(&packages, format, "No packages");
        }
    }
    Ok(())
}

fn created(package: Package, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("Created package {}", package.id),
        OutputFormat::Json => output::print(&PackageInfo::from(package), format),
    }
}
