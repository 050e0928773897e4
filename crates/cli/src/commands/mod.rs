// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands

pub mod account;
pub mod admin;
pub mod entitled;
pub mod ledger;
pub mod package;
pub mod purchase;
pub mod sweep;
pub mod unlock;
pub mod voucher;
pub mod wal;

use crate::config::Config;
use chrono::{DateTime, Utc};
use tally_core::{SystemClock, UuidIdGen};
use tally_engine::{Engine, EngineDeps, LedgerError, TracingNotifyAdapter};

/// Engine wired to the wall clock, random ids and log-only notifications
pub type LiveEngine = Engine<SystemClock, UuidIdGen, TracingNotifyAdapter>;

pub fn open_engine(config: &Config) -> Result<LiveEngine, LedgerError> {
    let deps = EngineDeps {
        clock: SystemClock,
        ids: UuidIdGen,
        notify: TracingNotifyAdapter,
    };
    Engine::open(
        &config.data_dir,
        config.store_config(),
        deps,
        config.engine_config(),
    )
}

/// `2026-03-01 12:00 UTC`
pub(crate) fn when(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
