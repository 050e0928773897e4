// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Membership windows, voucher expiry and ledger timestamps are all wall-clock
//! values, so the clock hands out `DateTime<Utc>` rather than monotonic instants.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a clock frozen at the given time
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(time)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Set the clock to a specific time
    pub fn set(&self, time: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = time;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Convert microseconds since the Unix epoch back into a timestamp
pub fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
