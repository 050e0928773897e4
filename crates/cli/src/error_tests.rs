// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tally_core::VoucherRejection;
use tally_engine::GENERIC_FAILURE;

#[test]
fn error_display() {
    let err = TallyError::new("Something went wrong")
        .with_context("First context")
        .with_context("Second context")
        .with_suggestion("Try this")
        .with_suggestion("Or this");

    let output = format!("{}", err);
    assert!(output.contains("error: Something went wrong"));
    assert!(output.contains("-> First context"));
    assert!(output.contains("-> Second context"));
    assert!(output.contains("1. Try this"));
    assert!(output.contains("2. Or this"));
}

#[test]
fn not_found_suggests_listing() {
    let err = TallyError::ledger(LedgerError::NotFound {
        kind: "account",
        id: "acct_x".to_string(),
    });
    let output = err.to_string();
    assert!(output.contains("error: Account not found."));
    assert!(output.contains("No account 'acct_x'"));
    assert!(output.contains("tally account list"));
}

#[test]
fn integrity_failures_hide_detail() {
    let err = TallyError::ledger(LedgerError::InvalidStateTransition {
        kind: "purchase",
        id: "pur_1".to_string(),
        from: tally_core::Status::Completed,
        to: tally_core::Status::Failed,
    });
    let output = err.to_string();
    assert!(output.contains(GENERIC_FAILURE));
    assert!(!output.contains("pur_1"));
}

#[yare::parameterized(
    tally = { anyhow::Error::new(TallyError::new("custom")), "error: custom" },
    ledger = {
        anyhow::Error::new(LedgerError::InvalidVoucher(VoucherRejection::Expired)),
        "error: This voucher has expired"
    },
    other = { anyhow::anyhow!("disk on fire"), "error: disk on fire" },
)]
fn anyhow_errors_become_printable(err: anyhow::Error, expected: &str) {
    let output = TallyError::from(err).to_string();
    assert!(output.starts_with(expected), "{}", output);
}

#[test]
fn wal_corruption_names_line() {
    let output = TallyError::wal_corruption(7, "checksum mismatch").to_string();
    assert!(output.contains("Line 7: checksum mismatch"));
    assert!(output.contains("tally wal repair"));
}
