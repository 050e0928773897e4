// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ledger operations

use tally_core::{ItemRef, Status, VoucherRejection};
use tally_storage::{ApplyError, WalStoreError};
use thiserror::Error;

/// Message shown to users for failures whose detail belongs in the logs only
pub const GENERIC_FAILURE: &str = "Something went wrong while processing your request. Please try again later.";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },
    #[error("invalid voucher: {0}")]
    InvalidVoucher(VoucherRejection),
    #[error("invalid {kind} transition for {id}: {from} -> {to}")]
    InvalidStateTransition {
        kind: &'static str,
        id: String,
        from: Status,
        to: Status,
    },
    #[error("concurrency conflict persisted after {attempts} attempts")]
    ConcurrencyConflict { attempts: u32 },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{item} is already unlocked")]
    AlreadyUnlocked { item: ItemRef },
    #[error("storage error: {0}")]
    Storage(#[from] WalStoreError),
}

impl LedgerError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidInput(message.into())
    }

    /// Map a commit failure, keeping business rejections distinct from
    /// storage faults. `attempts` is how many times the commit was tried.
    pub(crate) fn from_commit(err: WalStoreError, attempts: u32) -> Self {
        let WalStoreError::Apply(apply) = err else {
            return LedgerError::Storage(err);
        };
        match apply {
            ApplyError::InsufficientFunds {
                balance, required, ..
            } => LedgerError::InsufficientFunds { balance, required },
            ApplyError::VoucherRejected { reason, .. } => LedgerError::InvalidVoucher(reason),
            ApplyError::InvalidTransition { kind, id, from, to } => {
                LedgerError::InvalidStateTransition { kind, id, from, to }
            }
            ApplyError::VersionConflict { .. } => LedgerError::ConcurrencyConflict { attempts },
            ApplyError::NotFound { kind, id } => LedgerError::NotFound { kind, id },
            ApplyError::AlreadyExists { kind, id } => {
                LedgerError::InvalidInput(format!("{} {} already exists", kind, id))
            }
            other => LedgerError::Storage(WalStoreError::Apply(other)),
        }
    }

    /// Transient failures the caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict { .. })
    }

    /// Failures that indicate a bug or a broken store rather than a user
    /// mistake; logged at error level
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidStateTransition { .. } | LedgerError::Storage(_)
        )
    }

    /// Text safe to show an end user
    pub fn user_message(&self) -> String {
        match self {
            LedgerError::InsufficientFunds { balance, required } => format!(
                "Not enough coins: this costs {} but your balance is {}.",
                required, balance
            ),
            LedgerError::InvalidVoucher(reason) => capitalize(&reason.to_string()),
            LedgerError::ConcurrencyConflict { .. } => {
                "The system is busy right now. Please try again.".to_string()
            }
            LedgerError::NotFound { kind, .. } => capitalize(&format!("{} not found.", kind)),
            LedgerError::InvalidInput(message) => capitalize(message),
            LedgerError::AlreadyUnlocked { .. } => "You already own this item.".to_string(),
            LedgerError::InvalidStateTransition { .. } | LedgerError::Storage(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
