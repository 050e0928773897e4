// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions and typed identifiers

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique identifiers with a kind prefix (e.g. `acct`, `pur`)
pub trait IdGen: Clone + Send + Sync {
    fn next(&self, prefix: &str) -> String;
}

/// UUID-based ID generator for production use
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
    }
}

/// Sequential ID generator for testing
///
/// The counter is shared across prefixes so ids sort in creation order.
#[derive(Clone, Default)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", prefix, n)
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Allocate a fresh id from a generator
            pub fn generate(ids: &impl IdGen) -> Self {
                Self(ids.next(Self::PREFIX))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

typed_id!(
    /// Unique identifier for an account
    AccountId,
    "acct"
);
typed_id!(
    /// Unique identifier for a coin or membership package
    PackageId,
    "pkg"
);
typed_id!(
    /// Unique identifier for a purchase
    PurchaseId,
    "pur"
);
typed_id!(
    /// Unique identifier for a ledger entry
    LedgerEntryId,
    "txn"
);
