// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};
use yare::parameterized;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap()
}

fn make_purchase(details: PurchaseDetails) -> Purchase {
    Purchase {
        id: PurchaseId::new("pur-1"),
        account: AccountId::new("acct-1"),
        package: PackageId::new("pkg-1"),
        details,
        status: Status::Pending,
        original_price: UsdCents(999),
        price: UsdCents(999),
        voucher: None,
        payment_method: PaymentMethod::Paypal,
        transaction_id: None,
        ledger_entry: None,
        created_at: now(),
        updated_at: now(),
    }
}

fn membership_purchase() -> Purchase {
    make_purchase(PurchaseDetails::Membership {
        tier: Tier::Premium,
        duration_days: 30,
        starts_at: None,
        expires_at: None,
    })
}

#[test]
fn purchase_starts_pending() {
    let purchase = membership_purchase();
    assert_eq!(purchase.status, Status::Pending);
    assert!(purchase.is_membership());
    assert_eq!(purchase.ledger_type(), LedgerType::MembershipPurchase);
}

#[test]
fn coin_purchase_maps_to_coin_ledger_type() {
    let purchase = make_purchase(PurchaseDetails::Coins { coins: 500 });
    assert!(!purchase.is_membership());
    assert_eq!(purchase.ledger_type(), LedgerType::CoinPurchase);
}

#[test]
fn transition_updates_timestamp() {
    let later = now() + Duration::minutes(5);
    let completed = membership_purchase()
        .transition(Status::Completed, later)
        .unwrap();
    assert_eq!(completed.status, Status::Completed);
    assert_eq!(completed.updated_at, later);
    assert_eq!(completed.created_at, now());
}

#[parameterized(
    complete = { Status::Completed },
    fail = { Status::Failed },
    cancel = { Status::Cancelled },
)]
fn pending_can_settle(to: Status) {
    assert!(membership_purchase().transition(to, now()).is_ok());
}

#[test]
fn completing_twice_is_rejected() {
    let completed = membership_purchase()
        .transition(Status::Completed, now())
        .unwrap();
    let err = completed.transition(Status::Completed, now()).unwrap_err();
    assert_eq!(err.from, Status::Completed);
    assert_eq!(err.to, Status::Completed);
}

#[test]
fn refund_requires_completion() {
    assert!(membership_purchase()
        .transition(Status::Refunded, now())
        .is_err());
}

#[test]
fn payment_methods_classify_external_gateways() {
    assert!(PaymentMethod::Paypal.is_external());
    assert!(PaymentMethod::Cryptomus.is_external());
    assert!(!PaymentMethod::Coins.is_external());
    assert!(!PaymentMethod::Admin.is_external());
    assert_eq!("cryptomus".parse::<PaymentMethod>(), Ok(PaymentMethod::Cryptomus));
}
