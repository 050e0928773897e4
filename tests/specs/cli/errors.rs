//! Error reporting specs
//!
//! Failures print `error: ...` with context and suggestions on stderr and
//! exit non-zero.

use crate::prelude::*;

#[test]
fn unknown_account_suggests_listing() {
    Ledger::empty()
        .tally()
        .args(&["account", "show", "acct_missing"])
        .fails()
        .code(1)
        .stderr_has("error: Account not found.")
        .stderr_has("tally account list");
}

#[test]
fn malformed_item_is_a_usage_error() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger
        .tally()
        .args(&["unlock", "--account", &account, "book-7", "--price", "5"])
        .fails()
        .code(2)
        .stderr_has("expected ebook:<id> or chapter:<id>");
}

#[test]
fn broken_config_file_is_reported() {
    let ledger = Ledger::empty();
    ledger.file("tally.toml", "conflict_retries = \"many\"\n");
    ledger
        .tally()
        .args(&["account", "list"])
        .fails()
        .stderr_has("Cannot load config 'tally.toml'");
}

#[test]
fn config_file_is_picked_up_from_working_directory() {
    let ledger = Ledger::empty();
    ledger.file("tally.toml", "snapshot_interval = 1\n");
    ledger.account("Ada");
    // Every commit snapshots at interval 1
    assert!(ledger.data_dir().join("snapshots").is_dir());
}
