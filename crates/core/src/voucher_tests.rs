// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};
use proptest::prelude::*;
use yare::parameterized;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
}

fn voucher(discount_type: DiscountType, discount_value: u64) -> Voucher {
    Voucher {
        code: VoucherCode::parse("spring").unwrap(),
        voucher_type: VoucherType::Hybrid,
        discount_type,
        discount_value,
        usage_limit_type: UsageLimitType::Global,
        usage_limit: 5,
        usage_count: 0,
        expires_at: None,
        is_active: true,
        created_at: now() - Duration::days(30),
    }
}

#[test]
fn code_is_normalized_to_upper_case() {
    let code = VoucherCode::parse("  launch-20 ").unwrap();
    assert_eq!(code.as_str(), "LAUNCH-20");
}

#[parameterized(
    empty = { "   " },
    space_inside = { "two words" },
    punctuation = { "50%OFF" },
)]
fn code_rejects_invalid_input(raw: &str) {
    assert_eq!(VoucherCode::parse(raw), None);
}

#[test]
fn percent_discount_rounds_up() {
    assert_eq!(voucher(DiscountType::Percent, 50).calculate_discount(101), 51);
}

#[test]
fn flat_discount_is_capped_at_amount() {
    assert_eq!(voucher(DiscountType::Flat, 1000).calculate_discount(100), 100);
    assert_eq!(voucher(DiscountType::Flat, 30).calculate_discount(100), 30);
}

#[parameterized(
    exact = { 200, 25, 50 },
    rounds_up_small = { 1, 1, 1 },
    zero_amount = { 0, 50, 0 },
    full = { 999, 100, 999 },
    third = { 1000, 33, 330 },
    third_rounding = { 1001, 33, 331 },
)]
fn percent_discount_cases(amount: u64, percent: u64, expected: u64) {
    assert_eq!(percent_discount(amount, percent), expected);
}

#[test]
fn check_passes_for_usable_voucher() {
    let v = voucher(DiscountType::Percent, 10);
    assert_eq!(v.check(VoucherPurpose::Membership, VoucherUses::default(), now()), Ok(()));
}

#[test]
fn check_rejects_inactive_before_anything_else() {
    let v = Voucher {
        is_active: false,
        expires_at: Some(now() - Duration::days(1)),
        usage_count: 5,
        ..voucher(DiscountType::Flat, 10)
    };
    assert_eq!(
        v.check(VoucherPurpose::Ebook, VoucherUses::default(), now()),
        Err(VoucherRejection::Inactive)
    );
}

#[test]
fn check_rejects_expired_before_type() {
    let v = Voucher {
        voucher_type: VoucherType::Ebook,
        expires_at: Some(now()),
        ..voucher(DiscountType::Flat, 10)
    };
    assert_eq!(
        v.check(VoucherPurpose::Membership, VoucherUses::default(), now()),
        Err(VoucherRejection::Expired)
    );
}

#[parameterized(
    membership_for_ebook = { VoucherType::Membership, VoucherPurpose::Ebook, false },
    ebook_for_membership = { VoucherType::Ebook, VoucherPurpose::Membership, false },
    membership_for_membership = { VoucherType::Membership, VoucherPurpose::Membership, true },
    ebook_for_ebook = { VoucherType::Ebook, VoucherPurpose::Ebook, true },
    hybrid_for_ebook = { VoucherType::Hybrid, VoucherPurpose::Ebook, true },
    hybrid_for_membership = { VoucherType::Hybrid, VoucherPurpose::Membership, true },
)]
fn check_matches_voucher_type(voucher_type: VoucherType, purpose: VoucherPurpose, ok: bool) {
    let v = Voucher {
        voucher_type,
        ..voucher(DiscountType::Percent, 10)
    };
    let result = v.check(purpose, VoucherUses::default(), now());
    if ok {
        assert_eq!(result, Ok(()));
    } else {
        assert_eq!(result, Err(VoucherRejection::WrongType { purpose }));
    }
}

#[test]
fn global_limit_uses_voucher_counter() {
    let v = Voucher {
        usage_count: 5,
        ..voucher(DiscountType::Percent, 10)
    };
    assert_eq!(
        v.check(VoucherPurpose::Ebook, VoucherUses::default(), now()),
        Err(VoucherRejection::LimitReached)
    );
}

#[test]
fn per_user_limit_uses_redemption_count() {
    let v = Voucher {
        usage_limit_type: UsageLimitType::PerUser,
        usage_limit: 1,
        usage_count: 40,
        ..voucher(DiscountType::Percent, 10)
    };
    assert_eq!(v.check(VoucherPurpose::Ebook, VoucherUses::default(), now()), Ok(()));
    assert_eq!(
        v.check(VoucherPurpose::Ebook, VoucherUses::redeemed(1), now()),
        Err(VoucherRejection::LimitReached)
    );
}

#[test]
fn held_slots_count_against_a_global_limit() {
    let v = Voucher {
        usage_count: 3,
        ..voucher(DiscountType::Percent, 10)
    };
    let held = |held| VoucherUses {
        held,
        ..VoucherUses::default()
    };
    assert_eq!(v.check(VoucherPurpose::Ebook, held(1), now()), Ok(()));
    assert_eq!(
        v.check(VoucherPurpose::Ebook, held(2), now()),
        Err(VoucherRejection::LimitReached)
    );
}

#[test]
fn only_own_holds_count_against_a_per_user_limit() {
    let v = Voucher {
        usage_limit_type: UsageLimitType::PerUser,
        usage_limit: 1,
        ..voucher(DiscountType::Percent, 10)
    };
    let others = VoucherUses {
        held: 4,
        ..VoucherUses::default()
    };
    let own = VoucherUses {
        held: 1,
        user_held: 1,
        ..VoucherUses::default()
    };
    assert_eq!(v.check(VoucherPurpose::Membership, others, now()), Ok(()));
    assert_eq!(
        v.check(VoucherPurpose::Membership, own, now()),
        Err(VoucherRejection::LimitReached)
    );
}

#[test]
fn rejection_messages_are_distinct() {
    let messages = [
        VoucherRejection::NotFound.to_string(),
        VoucherRejection::Inactive.to_string(),
        VoucherRejection::Expired.to_string(),
        VoucherRejection::WrongType {
            purpose: VoucherPurpose::Ebook,
        }
        .to_string(),
        VoucherRejection::LimitReached.to_string(),
    ];
    for (i, a) in messages.iter().enumerate() {
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(
        VoucherRejection::LimitReached.to_string(),
        "this voucher has reached its usage limit"
    );
}

#[parameterized(
    zero_value = { DiscountType::Flat, 0, 1 },
    percent_over_100 = { DiscountType::Percent, 101, 1 },
    zero_limit = { DiscountType::Percent, 10, 0 },
)]
fn validate_rejects_bad_definitions(discount_type: DiscountType, value: u64, limit: u32) {
    let v = Voucher {
        usage_limit: limit,
        ..voucher(discount_type, value)
    };
    assert!(v.validate().is_err());
}

#[test]
fn enum_strings_parse_back() {
    assert_eq!("per_user".parse::<UsageLimitType>(), Ok(UsageLimitType::PerUser));
    assert_eq!(VoucherType::Hybrid.to_string(), "hybrid");
    assert!("bogus".parse::<DiscountType>().is_err());
}

proptest! {
    #[test]
    fn discount_never_exceeds_amount(amount in 0u64..10_000_000, value in 0u64..100_000, percent in any::<bool>()) {
        let discount_type = if percent { DiscountType::Percent } else { DiscountType::Flat };
        let v = voucher(discount_type, if percent { value % 101 } else { value });
        prop_assert!(v.calculate_discount(amount) <= amount);
    }

    #[test]
    fn percent_discount_is_smallest_covering_share(amount in 0u64..10_000_000, percent in 0u64..=100) {
        let discount = percent_discount(amount, percent);
        prop_assert!(u128::from(discount) * 100 >= u128::from(amount) * u128::from(percent));
        if discount > 0 {
            prop_assert!(u128::from(discount - 1) * 100 < u128::from(amount) * u128::from(percent));
        }
    }
}
