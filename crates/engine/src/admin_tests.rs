// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::fixtures::*;
use crate::LedgerError;
use tally_core::{ActivationKind, LedgerQuery, LedgerType, PaymentMethod, Tier};
use yare::parameterized;

#[test]
fn grants_and_deductions_are_tagged_admin() {
    let h = harness();
    let alice = h.account("alice");

    assert_eq!(h.engine.grant_coins(&alice, 50, "contest prize").unwrap(), 50);
    assert_eq!(h.engine.deduct_coins(&alice, 20, "chargeback").unwrap(), 30);

    let page = h.engine.query(&LedgerQuery::for_account(alice.clone()));
    let kinds: Vec<_> = page.items.iter().map(|e| e.entry_type).collect();
    assert_eq!(kinds, vec![LedgerType::AdminGrant, LedgerType::AdminDeduction]);
    assert!(page.items.iter().all(|e| e.payment_method == PaymentMethod::Admin));
    assert_eq!(page.items[0].description, "contest prize");
    assert_eq!(page.items[1].coins_spent, 20);
}

#[test]
fn deduction_cannot_overdraw() {
    let h = harness();
    let alice = h.funded("alice", 5);
    assert!(matches!(
        h.engine.deduct_coins(&alice, 6, "cleanup"),
        Err(LedgerError::InsufficientFunds { balance: 5, required: 6 })
    ));
}

#[parameterized(
    empty = { "" },
    blank = { "   " },
)]
fn adjustments_need_a_reason(reason: &str) {
    let h = harness();
    let alice = h.account("alice");
    assert!(matches!(
        h.engine.grant_coins(&alice, 5, reason),
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(matches!(
        h.engine.grant_membership(&alice, Tier::Premium, 5, reason),
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(h.engine.query(&Default::default()).items.is_empty());
}

#[test]
fn membership_grant_extends_like_a_purchase() {
    let h = harness();
    let alice = h.account("alice");
    h.engine.grant_membership(&alice, Tier::Premium, 10, "beta tester").unwrap();
    let second = h
        .engine
        .grant_membership(&alice, Tier::Premium, 10, "beta tester")
        .unwrap();

    assert_eq!(second.kind, ActivationKind::Extended);
    let page = h
        .engine
        .query(&LedgerQuery::for_account(alice).with_type(LedgerType::AdminMembershipGrant));
    assert_eq!(page.total, 2);
    assert_eq!(page.items[1].membership.as_ref().unwrap().days, 10);
}
