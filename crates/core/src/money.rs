// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! USD amounts held as integer cents

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A non-negative USD amount in cents
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UsdCents(pub u64);

impl UsdCents {
    pub const ZERO: UsdCents = UsdCents(0);

    pub fn new(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    pub fn saturating_sub(self, other: UsdCents) -> UsdCents {
        UsdCents(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for UsdCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid USD amount '{0}': expected dollars with at most two decimals")]
pub struct ParseUsdError(String);

impl FromStr for UsdCents {
    type Err = ParseUsdError;

    /// Parses `"4.99"`, `"$4.99"`, `"5"` or `"5.5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseUsdError(s.to_string());
        let trimmed = s.trim().trim_start_matches('$');
        let (dollars, cents) = match trimmed.split_once('.') {
            Some((d, c)) => (d, c),
            None => (trimmed, ""),
        };
        if dollars.is_empty() && cents.is_empty() {
            return Err(err());
        }
        let dollars: u64 = if dollars.is_empty() {
            0
        } else {
            dollars.parse().map_err(|_| err())?
        };
        let cents: u64 = match cents.len() {
            0 => 0,
            1 => cents.parse::<u64>().map_err(|_| err())? * 10,
            2 => cents.parse().map_err(|_| err())?,
            _ => return Err(err()),
        };
        dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .map(UsdCents)
            .ok_or_else(err)
    }
}
