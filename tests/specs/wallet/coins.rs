//! Coin wallet specs

use crate::prelude::*;

#[test]
fn grant_and_deduct_move_the_balance() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");

    ledger
        .tally()
        .args(&["admin", "grant-coins", &account, "100", "--reason", "welcome bonus"])
        .passes()
        .stdout_has(": 100");
    ledger
        .tally()
        .args(&["admin", "deduct-coins", &account, "30", "--reason", "chargeback"])
        .passes()
        .stdout_has(": 70");

    assert_eq!(ledger.balance(&account), 70);
    ledger
        .tally()
        .args(&["account", "show", &account])
        .passes()
        .stdout_has("Coins: 70")
        .stdout_has("Membership: free");
}

#[test]
fn overdraw_is_refused_and_balance_untouched() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 10);

    ledger
        .tally()
        .args(&["admin", "deduct-coins", &account, "11", "--reason", "oops"])
        .fails()
        .stderr_has("Not enough coins: this costs 11 but your balance is 10.");

    assert_eq!(ledger.balance(&account), 10);
}

#[test]
fn adjustments_need_a_reason() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger
        .tally()
        .args(&["admin", "grant-coins", &account, "5", "--reason", "  "])
        .fails()
        .stderr_has("Admin adjustments need a reason");
}

#[test]
fn balance_survives_restarts() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    for _ in 0..3 {
        ledger.grant(&account, 5);
    }
    assert_eq!(ledger.balance(&account), 15);
}
