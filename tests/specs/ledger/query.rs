//! Ledger audit specs

use crate::prelude::*;

#[test]
fn ledger_records_every_money_movement() {
    let ledger = Ledger::empty();
    let ada = ledger.account("Ada");
    let bob = ledger.account("Bob");
    let package = ledger.coin_package(100, "1.99");
    ledger.buy(&ada, &package, None);
    ledger.grant(&bob, 7);

    let page = ledger.json(&["ledger", "query", "--account", &ada]);
    assert_eq!(page["total"], 1);
    let entry = &page["items"][0];
    assert_eq!(entry["entry_type"], "coin_purchase");
    assert_eq!(entry["coins_received"], 100);
    assert_eq!(entry["amount_usd"], 199);

    let grants = ledger.json(&["ledger", "query", "--type", "admin_grant"]);
    assert_eq!(grants["total"], 1);
    assert_eq!(grants["items"][0]["account"], bob.as_str());
}

#[test]
fn pagination_reports_totals() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    for _ in 0..3 {
        ledger.grant(&account, 1);
    }

    let page = ledger.json(&["ledger", "query", "--per-page", "2", "--page", "2"]);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    ledger
        .tally()
        .args(&["ledger", "query", "--per-page", "2"])
        .passes()
        .stdout_has("page 1 of 2 (3 entries)");
}

#[test]
fn unknown_entry_is_not_found() {
    Ledger::empty()
        .tally()
        .args(&["ledger", "show", "txn_missing"])
        .fails()
        .stderr_has("Ledger entry not found.");
}
