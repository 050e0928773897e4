// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tally-engine: concurrency-aware wallet, entitlement and voucher services
//! on top of the WAL store

mod admin;
mod catalogue;
mod config;
mod engine;
mod entitlement;
mod error;
mod gating;
mod ledger;
mod locks;
mod lookup;
pub mod notify;
mod purchases;
mod sweeper;
mod voucher;
mod wallet;

#[cfg(test)]
mod fixtures;

pub use catalogue::NewVoucher;
pub use config::EngineConfig;
pub use engine::{Engine, EngineDeps};
pub use error::{LedgerError, GENERIC_FAILURE};
pub use locks::KeyedLocks;
pub use notify::{NoOpNotifyAdapter, NotifyAdapter, NotifyError, TracingNotifyAdapter};
pub use purchases::UnlockReceipt;
pub use voucher::{Quote, UsageDrift};

#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifyAdapter;
