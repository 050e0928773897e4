//! Membership purchase specs

use crate::prelude::*;
use serde_json::Value;

/// RFC 3339 expiry; same-format timestamps compare correctly as strings
fn expiry(ledger: &Ledger, account: &str) -> String {
    let shown: Value = ledger.json(&["account", "show", account]);
    shown["expires_at"].as_str().unwrap().to_string()
}

#[test]
fn second_purchase_extends_instead_of_restarting() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.premium_package(30, "9.99");

    ledger.buy(&account, &package, None);
    let first = expiry(&ledger, &account);
    ledger.buy(&account, &package, None);
    let second = expiry(&ledger, &account);

    assert!(second > first);
    let shown = ledger.json(&["account", "show", &account]);
    assert_eq!(shown["tier"], "premium");
    assert_eq!(shown["active"], true);
}

#[test]
fn premium_content_follows_membership() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");

    ledger
        .tally()
        .args(&["entitled", "--account", &account, "--premium"])
        .passes()
        .stdout_has("not entitled");

    ledger
        .tally()
        .args(&["admin", "grant-membership", &account, "--days", "7", "--reason", "contest"])
        .passes()
        .stdout_has("Activated premium");

    let verdict = ledger.json(&["entitled", "--account", &account, "--premium"]);
    assert_eq!(verdict["entitled"], true);
}

#[test]
fn sweep_leaves_active_members_alone() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.premium_package(30, "9.99");
    ledger.buy(&account, &package, None);

    ledger
        .tally()
        .args(&["sweep"])
        .passes()
        .stdout_has("Expired 0 memberships");
    assert_eq!(ledger.json(&["account", "show", &account])["tier"], "premium");
}
