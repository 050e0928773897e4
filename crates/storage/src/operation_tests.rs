// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fixtures::{account_id, create_account, grant, t0};
use tally_core::ItemRef;
use yare::parameterized;

#[test]
fn operations_are_tagged_by_type() {
    let json = serde_json::to_value(create_account("alice")).unwrap();
    assert_eq!(json["type"], "account_create");
    assert_eq!(json["account"]["id"], "alice");
}

#[test]
fn optional_transition_fields_are_omitted() {
    let op = Operation::PurchaseTransition(PurchaseTransitionOp {
        id: PurchaseId::new("pur-1"),
        from: Status::Pending,
        to: Status::Cancelled,
        transaction_id: None,
        ledger_entry: None,
        starts_at: None,
        expires_at: None,
        at: t0(),
    });
    let json = serde_json::to_string(&op).unwrap();
    assert!(json.contains("\"to\":\"cancelled\""));
    assert!(!json.contains("transaction_id"));
    assert!(!json.contains("expires_at"));

    let parsed: Operation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, op);
}

#[test]
fn snapshot_marker_parses_from_json() {
    let parsed: Operation =
        serde_json::from_str(r#"{"type":"snapshot_taken","snapshot_id":"00000004-x"}"#).unwrap();
    assert_eq!(
        parsed,
        Operation::SnapshotTaken {
            snapshot_id: "00000004-x".to_string()
        }
    );
    assert_eq!(parsed.name(), "snapshot_taken");
}

#[parameterized(
    credit = { grant("txn-1", "alice", 5, 0).remove(0), true },
    ledger = { grant("txn-1", "alice", 5, 0).remove(1), false },
    unlock = { Operation::UnlockCreate(UnlockCreateOp { account: account_id("alice"), item: ItemRef::ebook("e1") }), true },
    expire = { Operation::MembershipExpire(MembershipExpireOp { account: account_id("alice"), expected_version: 0, at: t0() }), true },
    account = { create_account("alice"), false },
)]
fn entitlement_mutations(op: Operation, expected: bool) {
    assert_eq!(op.is_entitlement_mutation(), expected);
}
