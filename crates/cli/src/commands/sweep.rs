// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Membership expiry sweep, once or on an interval

use super::LiveEngine;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Args)]
pub struct SweepArgs {
    /// Keep running, sweeping at this interval (e.g. 10m, 1h)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub every: Option<Duration>,
}

#[derive(Serialize)]
struct SweepReport {
    expired: usize,
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expired {
            1 => write!(f, "Expired 1 membership"),
            n => write!(f, "Expired {} memberships", n),
        }
    }
}

pub async fn handle(args: SweepArgs, engine: &LiveEngine, format: OutputFormat) -> Result<()> {
    let Some(every) = args.every else {
        let expired = engine.sweep()?;
        output::print(&SweepReport { expired }, format);
        return Ok(());
    };

    tracing::info!(interval = %humantime::format_duration(every), "sweeper started");
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // A failed pass is retried on the next tick
                match engine.sweep() {
                    Ok(expired) => output::print(&SweepReport { expired }, format),
                    Err(e) => tracing::error!(error = %e, "sweep failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("sweeper stopping");
                return Ok(());
            }
        }
    }
}
