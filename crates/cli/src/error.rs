// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! This module provides enhanced error types that include:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use std::fmt;
use std::path::Path;
use tally_engine::LedgerError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct TallyError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TallyError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for TallyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for TallyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for typical failure scenarios.
impl TallyError {
    /// Error for a config file that cannot be read or parsed.
    pub fn config_invalid(path: &Path, reason: impl fmt::Display) -> Self {
        TallyError::new(format!("Cannot load config '{}'", path.display()))
            .with_context(reason.to_string())
            .with_suggestion("Check the file against the documented tally.toml keys")
            .with_suggestion("Point at another file with --config or TALLY_CONFIG")
    }

    /// Error for when WAL corruption is detected.
    pub fn wal_corruption(line: u64, reason: &str) -> Self {
        TallyError::new("WAL corruption detected")
            .with_context(format!("Line {}: {}", line, reason))
            .with_context("This may be caused by a crash during write or disk corruption")
            .with_suggestion("Truncate the damaged tail: tally wal repair")
    }

    /// Error for a failed ledger operation, shown in customer-safe wording.
    pub fn ledger(err: LedgerError) -> Self {
        let message = err.user_message();
        let error = match &err {
            LedgerError::NotFound { kind, id } => {
                let error = TallyError::new(message).with_context(format!("No {} '{}'", kind, id));
                match list_command(kind) {
                    Some(command) => error.with_suggestion(format!("List what exists: {}", command)),
                    None => error,
                }
            }
            LedgerError::InsufficientFunds { .. } => TallyError::new(message)
                .with_suggestion("Buy a coin package: tally purchase create")
                .with_suggestion("Or grant coins: tally admin grant-coins"),
            LedgerError::InvalidVoucher(_) => TallyError::new(message)
                .with_suggestion("Inspect the voucher: tally voucher list"),
            LedgerError::ConcurrencyConflict { attempts } => TallyError::new(message)
                .with_context(format!("Gave up after {} attempts", attempts))
                .with_suggestion("Run the command again"),
            LedgerError::AlreadyUnlocked { item } => {
                TallyError::new(message).with_context(format!("{} was unlocked earlier", item))
            }
            LedgerError::InvalidInput(_) => TallyError::new(message),
            LedgerError::InvalidStateTransition { .. } | LedgerError::Storage(_) => {
                TallyError::new(message)
                    .with_context("Details were written to the log")
                    .with_suggestion("Check the data directory: tally wal validate")
            }
        };
        error.with_source(err)
    }
}

fn list_command(kind: &str) -> Option<&'static str> {
    match kind {
        "account" => Some("tally account list"),
        "package" => Some("tally package list"),
        "voucher" => Some("tally voucher list"),
        _ => None,
    }
}

/// Unwrap whatever a command returned into something printable
impl From<anyhow::Error> for TallyError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<TallyError>() {
            Ok(error) => return error,
            Err(err) => err,
        };
        match err.downcast::<LedgerError>() {
            Ok(error) => TallyError::ledger(error),
            Err(err) => TallyError::new(format!("{:#}", err)),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
