// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness shared by the engine unit tests

use crate::{Engine, EngineConfig, EngineDeps, FakeNotifyAdapter, NewVoucher};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tally_core::{
    AccountId, DiscountType, FakeClock, MembershipPackage, PackageFeature, PackageId,
    SequentialIdGen, Tier, UsageLimitType, UsdCents, Voucher, VoucherType,
};
use tally_storage::WalStoreConfig;
use tempfile::TempDir;

pub type TestEngine = Engine<FakeClock, SequentialIdGen, FakeNotifyAdapter>;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn store_config() -> WalStoreConfig {
    WalStoreConfig {
        snapshot_interval: 10_000,
        keep_old_snapshots: 1,
        compaction_threshold: 10_000,
        machine_id: "test".to_string(),
    }
}

pub struct Harness {
    pub engine: TestEngine,
    pub clock: FakeClock,
    pub notify: FakeNotifyAdapter,
    pub dir: TempDir,
}

pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let dir = TempDir::new().unwrap();
    let clock = FakeClock::at(t0());
    let notify = FakeNotifyAdapter::new();
    let engine = Engine::open(
        dir.path(),
        store_config(),
        EngineDeps {
            clock: clock.clone(),
            ids: SequentialIdGen::new(),
            notify: notify.clone(),
        },
        config,
    )
    .unwrap();
    Harness {
        engine,
        clock,
        notify,
        dir,
    }
}

impl Harness {
    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    pub fn account(&self, name: &str) -> AccountId {
        self.engine.create_account(name).unwrap().id
    }

    /// An account holding `coins`
    pub fn funded(&self, name: &str, coins: u64) -> AccountId {
        let id = self.account(name);
        self.engine.grant_coins(&id, coins, "test funds").unwrap();
        id
    }

    pub fn coin_package(&self, coins: u64, cents: u64) -> PackageId {
        self.engine
            .create_coin_package(&format!("{} coins", coins), coins, UsdCents(cents))
            .unwrap()
            .id
    }

    pub fn premium_package(&self, days: u32, cents: u64) -> PackageId {
        self.engine
            .create_membership_package(
                &format!("Premium {} days", days),
                MembershipPackage {
                    tier: Tier::Premium,
                    duration_days: days,
                    price: UsdCents(cents),
                    was_price: None,
                    features: vec![PackageFeature::AdFree],
                },
            )
            .unwrap()
            .id
    }

    pub fn voucher(
        &self,
        code: &str,
        voucher_type: VoucherType,
        discount_type: DiscountType,
        discount_value: u64,
        usage_limit_type: UsageLimitType,
        usage_limit: u32,
    ) -> Voucher {
        self.engine
            .create_voucher(NewVoucher {
                code: code.to_string(),
                voucher_type,
                discount_type,
                discount_value,
                usage_limit_type,
                usage_limit,
                expires_at: None,
            })
            .unwrap()
    }

    /// 50% hybrid voucher limited to one use per account
    pub fn half_off(&self, code: &str) -> Voucher {
        self.voucher(
            code,
            VoucherType::Hybrid,
            DiscountType::Percent,
            50,
            UsageLimitType::PerUser,
            1,
        )
    }
}
