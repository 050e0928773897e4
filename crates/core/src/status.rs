// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Settlement status shared by purchases and their mirrored ledger entries
//!
//! ```text
//! pending ─┬─> completed ──> refunded
//!          ├─> failed
//!          └─> cancelled
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

/// Rejected status change
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: Status,
    pub to: Status,
}

impl Status {
    pub fn can_transition_to(self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Pending, Status::Completed)
                | (Status::Pending, Status::Failed)
                | (Status::Pending, Status::Cancelled)
                | (Status::Completed, Status::Refunded)
        )
    }

    /// Validate a transition, returning the target status
    pub fn transition(self, to: Status) -> Result<Status, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }

    /// No further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Failed | Status::Refunded | Status::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Refunded => "refunded",
            Status::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            "refunded" => Ok(Status::Refunded),
            "cancelled" => Ok(Status::Cancelled),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}
