//! WAL maintenance specs

use crate::prelude::*;
use std::io::Write;

#[test]
fn validate_reports_entry_count() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 3);

    ledger
        .tally()
        .args(&["wal", "validate"])
        .passes()
        .stdout_has("WAL OK: 2 entries");
}

#[test]
fn torn_tail_is_detected_and_repaired() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 3);
    {
        let mut wal = std::fs::OpenOptions::new()
            .append(true)
            .open(ledger.wal_path())
            .unwrap();
        wal.write_all(b"{\"sequence\":9,\"torn").unwrap();
    }

    ledger
        .tally()
        .args(&["wal", "validate"])
        .fails()
        .stderr_has("WAL corruption detected")
        .stderr_has("tally wal repair");

    // Reads still see every committed batch
    assert_eq!(ledger.balance(&account), 3);

    ledger
        .tally()
        .args(&["wal", "repair"])
        .passes()
        .stdout_has("Removed");
    ledger.tally().args(&["wal", "validate"]).passes();
    ledger
        .tally()
        .args(&["wal", "repair"])
        .passes()
        .stdout_has("nothing to repair");
}

#[test]
fn snapshot_and_compact_keep_state() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 4);
    ledger.grant(&account, 6);

    ledger
        .tally()
        .args(&["wal", "snapshot", "--compact"])
        .passes()
        .stdout_has("compacted 3 entries");

    assert_eq!(ledger.balance(&account), 10);
    ledger.grant(&account, 1);
    assert_eq!(ledger.balance(&account), 11);
}
