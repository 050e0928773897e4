// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tally_core::Event;

/// Fake notification adapter recording every delivered event
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    events: Arc<Mutex<Vec<Event>>>,
    failing: Arc<AtomicBool>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in delivery order
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Names of recorded events, e.g. `wallet:credited`
    pub fn names(&self) -> Vec<String> {
        self.events().iter().map(Event::name).collect()
    }

    /// Make subsequent deliveries fail
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl NotifyAdapter for FakeNotifyAdapter {
    fn notify(&self, event: &Event) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::SendFailed("fake failure".to_string()));
        }
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
