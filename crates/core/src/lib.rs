// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tally-core: domain model for the wallet & entitlement ledger
//!
//! This crate provides:
//! - Accounts with coin balances and membership periods (extend vs. activate)
//! - Catalogue packages, purchases and the shared settlement state machine
//! - Voucher rules and discount arithmetic
//! - Ledger entries and audit queries
//! - Clock and id abstractions for deterministic tests
//!
//! Everything here is pure: persistence lives in `tally-storage` and the
//! concurrency-aware services in `tally-engine`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod account;
pub mod clock;
pub mod event;
pub mod id;
pub mod item;
pub mod ledger;
pub mod money;
pub mod package;
pub mod purchase;
pub mod status;
pub mod voucher;

pub use account::{Account, Activation, ActivationKind, InsufficientFunds, Membership, Tier};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
pub use id::{AccountId, IdGen, LedgerEntryId, PackageId, PurchaseId, SequentialIdGen, UuidIdGen};
pub use item::{ItemKind, ItemRef};
pub use ledger::{LedgerEntry, LedgerQuery, LedgerType, MembershipWindow, Page};
pub use money::UsdCents;
pub use package::{CoinPackage, MembershipPackage, Package, PackageFeature, PackageKind};
pub use purchase::{AppliedVoucher, PaymentMethod, Purchase, PurchaseDetails};
pub use status::{Status, TransitionError};
pub use voucher::{
    DiscountType, UsageLimitType, Voucher, VoucherCode, VoucherPurpose, VoucherRejection,
    VoucherType, VoucherUsage, VoucherUses,
};
