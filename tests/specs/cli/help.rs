//! Help and version specs

use crate::prelude::*;

#[test]
fn help_lists_command_groups() {
    let ledger = Ledger::empty();
    let run = ledger.tally().args(&["--help"]).passes();
    for group in ["account", "package", "voucher", "purchase", "unlock", "admin", "ledger", "sweep", "wal", "entitled"] {
        assert!(run.stdout().contains(group), "missing {}", group);
    }
}

#[test]
fn version_names_binary() {
    Ledger::empty()
        .tally()
        .args(&["--version"])
        .passes()
        .stdout_has("tally");
}

#[test]
fn empty_ledger_lists_nothing() {
    let ledger = Ledger::empty();
    ledger.tally().args(&["account", "list"]).passes().stdout_has("No accounts");
    ledger.tally().args(&["package", "list"]).passes().stdout_has("No packages");
    ledger.tally().args(&["voucher", "list"]).passes().stdout_has("No vouchers");
}
