//! Voucher redemption specs

use crate::prelude::*;

fn half_off(ledger: &Ledger, code: &str) {
    ledger
        .tally()
        .args(&[
            "voucher", "create", code, "--type", "hybrid", "--discount", "percent", "--value", "50",
        ])
        .passes()
        .stdout_has("Created voucher");
}

#[test]
fn codes_are_case_insensitive() {
    let ledger = Ledger::empty();
    half_off(&ledger, "spring50");
    ledger.tally().args(&["voucher", "list"]).passes().stdout_has("SPRING50");
}

#[test]
fn membership_voucher_discounts_the_price_once_per_user() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.premium_package(30, "10.00");
    half_off(&ledger, "HALF");

    let quote = ledger.json(&[
        "voucher", "validate", "HALF", "--account", &account, "--for", "membership", "--amount", "1000",
    ]);
    assert_eq!(quote["final_amount"], 500);

    let id = ledger.buy(&account, &package, Some("half"));
    let purchase = ledger.json(&["purchase", "show", &id]);
    assert_eq!(purchase["price"], 500);
    assert_eq!(purchase["original_price"], 1000);
    assert_eq!(purchase["status"], "completed");

    let usages = ledger.json(&["voucher", "usages", "HALF"]);
    assert_eq!(usages.as_array().unwrap().len(), 1);

    ledger
        .tally()
        .args(&["purchase", "create", "--account", &account, "--package", &package, "--voucher", "HALF"])
        .fails()
        .stderr_has("This voucher has reached its usage limit");
}

#[test]
fn vouchers_do_not_apply_to_coin_packages() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.coin_package(100, "1.99");
    half_off(&ledger, "HALF");

    ledger
        .tally()
        .args(&["purchase", "create", "--account", &account, "--package", &package, "--voucher", "HALF"])
        .fails()
        .stderr_has("Vouchers cannot be applied to coin packages");
}

#[test]
fn deactivated_and_unknown_vouchers_are_rejected() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    half_off(&ledger, "HALF");
    ledger.tally().args(&["voucher", "deactivate", "HALF"]).passes();

    ledger
        .tally()
        .args(&["voucher", "validate", "HALF", "--account", &account, "--for", "ebook"])
        .fails()
        .stderr_has("This voucher is no longer active");
    ledger
        .tally()
        .args(&["voucher", "validate", "NOPE", "--account", &account, "--for", "ebook"])
        .fails()
        .stderr_has("Voucher code not found");
}

#[test]
fn audit_is_clean_after_redemptions() {
    let ledger = Ledger::empty();
    let account = ledger.account("Ada");
    let package = ledger.premium_package(30, "10.00");
    ledger
        .tally()
        .args(&[
            "voucher", "create", "LAUNCH", "--type", "membership", "--discount", "flat", "--value",
            "200", "--limit-type", "global", "--limit", "10",
        ])
        .passes();
    ledger.buy(&account, &package, Some("LAUNCH"));

    ledger
        .tally()
        .args(&["voucher", "audit"])
        .passes()
        .stdout_has("Usage counters match the redemption log");
    ledger
        .tally()
        .args(&["voucher", "list"])
        .passes()
        .stdout_has("1/10 global");
}
