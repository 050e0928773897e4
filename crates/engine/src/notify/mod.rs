// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of committed domain events to the outside world
//!
//! Notification is best effort: the engine logs a failed delivery and never
//! undoes the commit that produced the event.

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifyAdapter;

use tally_core::Event;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    SendFailed(String),
}

/// Receives events after their commit is durable
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    fn notify(&self, event: &Event) -> Result<(), NotifyError>;
}

/// Drops every event
#[derive(Clone, Copy, Default)]
pub struct NoOpNotifyAdapter;

impl NotifyAdapter for NoOpNotifyAdapter {
    fn notify(&self, _event: &Event) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Writes every event to the log at info level
#[derive(Clone, Copy, Default)]
pub struct TracingNotifyAdapter;

impl NotifyAdapter for TracingNotifyAdapter {
    fn notify(&self, event: &Event) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
        tracing::info!(event = %event.name(), account = %event.account(), %payload, "notify");
        Ok(())
    }
}
