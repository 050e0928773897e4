//! Coin unlock specs

use crate::prelude::*;

#[test]
fn unlocking_debits_coins_and_grants_access() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 50);

    ledger
        .tally()
        .args(&["entitled", "--account", &account, "--item", "chapter:9", "--price", "20"])
        .passes()
        .stdout_has("not entitled");

    ledger
        .tally()
        .args(&["unlock", "--account", &account, "chapter:9", "--price", "20"])
        .passes()
        .stdout_has("Unlocked chapter:9 for 20 coins; balance 30");

    ledger
        .tally()
        .args(&["entitled", "--account", &account, "--item", "chapter:9", "--price", "20"])
        .passes()
        .stdout_has("is entitled");
    ledger
        .tally()
        .args(&["account", "show", &account])
        .passes()
        .stdout_has("Unlocked: chapter:9");
}

#[test]
fn unlocking_twice_is_refused() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 50);
    ledger
        .tally()
        .args(&["unlock", "--account", &account, "ebook:1", "--price", "10"])
        .passes();

    ledger
        .tally()
        .args(&["unlock", "--account", &account, "ebook:1", "--price", "10"])
        .fails()
        .stderr_has("You already own this item.");
    assert_eq!(ledger.balance(&account), 40);
}

#[test]
fn unlock_without_coins_is_refused() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 5);

    ledger
        .tally()
        .args(&["unlock", "--account", &account, "ebook:1", "--price", "10"])
        .fails()
        .stderr_has("Not enough coins");
    assert_eq!(ledger.balance(&account), 5);
}

#[test]
fn ebook_voucher_lowers_the_coin_price() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    ledger.grant(&account, 100);
    ledger
        .tally()
        .args(&["voucher", "create", "BOOK", "--type", "ebook", "--discount", "percent", "--value", "25"])
        .passes();

    let receipt = ledger.json(&[
        "unlock", "--account", &account, "ebook:3", "--price", "40", "--voucher", "BOOK",
    ]);
    assert_eq!(receipt["price_paid"], 30);
    assert_eq!(receipt["discount"], 10);
    assert_eq!(receipt["balance"], 70);
}

#[test]
fn free_content_needs_no_unlock() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let verdict = ledger.json(&["entitled", "--account", &account, "--item", "chapter:1"]);
    assert_eq!(verdict["entitled"], true);
}
