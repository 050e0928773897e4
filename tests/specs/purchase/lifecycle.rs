//! Purchase lifecycle specs

use crate::prelude::*;

#[test]
fn confirmed_coin_purchase_credits_wallet() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(500, "4.99");

    let purchase = ledger.json(&["purchase", "create", "--account", &account, "--package", &package]);
    assert_eq!(purchase["status"], "pending");
    assert_eq!(ledger.balance(&account), 0);

    let id = id_of(&purchase);
    let confirmed = ledger.json(&["purchase", "confirm", &id, "--ref", "PAY-123"]);
    assert_eq!(confirmed["status"], "completed");
    assert_eq!(confirmed["transaction_id"], "PAY-123");
    assert!(confirmed["ledger_entry"].is_string());
    assert_eq!(ledger.balance(&account), 500);
}

#[test]
fn confirming_twice_fails_without_double_credit() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(100, "1.99");
    let id = ledger.buy(&account, &package, None);

    ledger
        .tally()
        .args(&["purchase", "confirm", &id, "--ref", "again"])
        .fails()
        .stderr_has("Something went wrong while processing your request.");
    assert_eq!(ledger.balance(&account), 100);
}

#[test]
fn failed_and_cancelled_purchases_deliver_nothing() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(100, "1.99");

    for verb in ["fail", "cancel"] {
        let id = id_of(&ledger.json(&["purchase", "create", "--account", &account, "--package", &package]));
        ledger.tally().args(&["purchase", verb, &id]).passes();
    }

    let purchases = ledger.json(&["purchase", "list", "--account", &account]);
    let statuses: Vec<&str> = purchases
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"failed"));
    assert!(statuses.contains(&"cancelled"));
    assert_eq!(ledger.balance(&account), 0);
}

#[test]
fn refund_marks_purchase_and_ledger_entry() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(100, "1.99");
    let id = ledger.buy(&account, &package, None);

    let refunded = ledger.json(&["purchase", "refund", &id]);
    assert_eq!(refunded["status"], "refunded");

    let entry = refunded["ledger_entry"].as_str().unwrap();
    let entry = ledger.json(&["ledger", "show", entry]);
    assert_eq!(entry["status"], "refunded");
}

#[test]
fn retired_package_cannot_be_bought() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(100, "1.99");
    ledger.tally().args(&["package", "deactivate", &package]).passes();

    ledger
        .tally()
        .args(&["purchase", "create", "--account", &account, "--package", &package])
        .fails()
        .stderr_has("is no longer on sale");
    ledger
        .tally()
        .args(&["package", "list", "--all"])
        .passes()
        .stdout_has("[inactive]");
}

#[test]
fn gateway_purchases_need_a_gateway_method() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(100, "1.99");
    ledger
        .tally()
        .args(&["purchase", "create", "--account", &account, "--package", &package, "--method", "coins"])
        .fails()
        .stderr_has("Coins is not a gateway payment method");
}
