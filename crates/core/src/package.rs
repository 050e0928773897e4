// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalogue packages
//!
//! Packages are never edited once created; retiring one only flips `active`,
//! so completed purchases keep pointing at the price they were sold for.

use crate::account::Tier;
use crate::id::PackageId;
use crate::money::UsdCents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A perk advertised with a membership package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageFeature {
    AdFree,
    PremiumChapters,
    EarlyAccess,
    EbookDiscounts,
    PrioritySupport,
}

impl fmt::Display for PackageFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageFeature::AdFree => "ad_free",
            PackageFeature::PremiumChapters => "premium_chapters",
            PackageFeature::EarlyAccess => "early_access",
            PackageFeature::EbookDiscounts => "ebook_discounts",
            PackageFeature::PrioritySupport => "priority_support",
        };
        f.write_str(name)
    }
}

impl FromStr for PackageFeature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ad_free" => Ok(PackageFeature::AdFree),
            "premium_chapters" => Ok(PackageFeature::PremiumChapters),
            "early_access" => Ok(PackageFeature::EarlyAccess),
            "ebook_discounts" => Ok(PackageFeature::EbookDiscounts),
            "priority_support" => Ok(PackageFeature::PrioritySupport),
            other => Err(format!("unknown package feature: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPackage {
    pub coins: u64,
    pub price: UsdCents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPackage {
    pub tier: Tier,
    pub duration_days: u32,
    pub price: UsdCents,
    /// Strike-through price shown next to `price`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_price: Option<UsdCents>,
    #[serde(default)]
    pub features: Vec<PackageFeature>,
}

impl MembershipPackage {
    /// Whole-percent saving against `was_price`, rounded down
    pub fn savings_percent(&self) -> Option<u64> {
        let was = self.was_price?.cents();
        let now = self.price.cents();
        if was == 0 || now >= was {
            return None;
        }
        Some((was - now) * 100 / was)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackageKind {
    Coins(CoinPackage),
    Membership(MembershipPackage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub kind: PackageKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Package {
    pub fn price(&self) -> UsdCents {
        match &self.kind {
            PackageKind::Coins(coins) => coins.price,
            PackageKind::Membership(membership) => membership.price,
        }
    }

    pub fn is_membership(&self) -> bool {
        matches!(self.kind, PackageKind::Membership(_))
    }

    /// Check catalogue rules before the package is written
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("package name must not be empty".to_string());
        }
        match &self.kind {
            PackageKind::Coins(coins) if coins.coins == 0 => {
                Err("coin package must grant at least one coin".to_string())
            }
            PackageKind::Membership(membership) if !membership.tier.is_paid() => {
                Err("membership package must be for a paid tier".to_string())
            }
            PackageKind::Membership(membership) if membership.duration_days == 0 => {
                Err("membership package must last at least one day".to_string())
            }
            _ => Ok(()),
        }
    }
}
