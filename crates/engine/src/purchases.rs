// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Purchases settled by an outside gateway, and coin-funded unlocks
//!
//! A purchase is created `pending` and only delivers coins or membership in
//! the single commit that confirms it. The gateway itself is never called
//! from here; callers report its outcome.

use crate::engine::{Engine, Plan};
use crate::error::LedgerError;
use crate::notify::NotifyAdapter;
use crate::voucher::{parse_code, redeem, redeem_op, usable};
use crate::{entitlement, lookup, wallet};
use serde::Serialize;
use tally_core::{
    AccountId, AppliedVoucher, Clock, Event, IdGen, ItemKind, ItemRef, LedgerEntry,
    LedgerEntryId, LedgerType, PackageId, PackageKind, PaymentMethod, Purchase, PurchaseDetails,
    PurchaseId, Status, UsdCents, VoucherPurpose,
};
use tally_storage::{
    LedgerAppendOp, LedgerTransitionOp, Operation, PurchaseCreateOp, PurchaseTransitionOp,
    UnlockCreateOp,
};

/// Outcome of a coin-funded unlock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockReceipt {
    pub item: ItemRef,
    pub entry: LedgerEntryId,
    /// Coins actually debited
    pub price_paid: u64,
    pub discount: u64,
    pub balance: u64,
}

fn transition_error(purchase: &Purchase, to: Status) -> LedgerError {
    LedgerError::InvalidStateTransition {
        kind: "purchase",
        id: purchase.id.to_string(),
        from: purchase.status,
        to,
    }
}

impl<C, I, N> Engine<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: NotifyAdapter,
{
    /// Open a pending purchase of `package`, priced with the voucher if one
    /// is given. Vouchers only discount membership packages.
    ///
    /// A voucher-priced purchase holds one slot of the voucher's limit until
    /// it completes, fails or is cancelled.
    pub fn create_purchase(
        &self,
        account: &AccountId,
        package: &PackageId,
        payment_method: PaymentMethod,
        voucher: Option<&str>,
    ) -> Result<Purchase, LedgerError> {
        if !payment_method.is_external() {
            return Err(LedgerError::invalid(format!(
                "{} is not a gateway payment method",
                payment_method
            )));
        }
        let code = voucher.map(parse_code).transpose()?;
        let id = PurchaseId::generate(self.ids());
        let locks = self.locks(account, code.as_ref());
        let _held = locks.hold();

        self.execute("create_purchase", |state, now| {
            lookup::account(state, account)?;
            let package = lookup::package(state, package)?;
            if !package.active {
                return Err(LedgerError::invalid(format!(
                    "package {} is no longer on sale",
                    package.id
                )));
            }

            let original_price = package.price();
            let details = match &package.kind {
                PackageKind::Coins(coins) => {
                    if code.is_some() {
                        return Err(LedgerError::invalid(
                            "vouchers cannot be applied to coin packages",
                        ));
                    }
                    PurchaseDetails::Coins { coins: coins.coins }
                }
                PackageKind::Membership(membership) => PurchaseDetails::Membership {
                    tier: membership.tier,
                    duration_days: membership.duration_days,
                    starts_at: None,
                    expires_at: None,
                },
            };
            let applied = match &code {
                Some(code) => {
                    let voucher = usable(state, code, account, VoucherPurpose::Membership, now)?;
                    Some(AppliedVoucher {
                        code: code.clone(),
                        discount: UsdCents(voucher.calculate_discount(original_price.cents())),
                    })
                }
                None => None,
            };
            let price = applied
                .as_ref()
                .map_or(original_price, |a| original_price.saturating_sub(a.discount));

            let purchase = Purchase {
                id: id.clone(),
                account: account.clone(),
                package: package.id.clone(),
                details,
                status: Status::Pending,
                original_price,
                price,
                voucher: applied,
                payment_method,
                transaction_id: None,
                ledger_entry: None,
                created_at: now,
                updated_at: now,
            };
            let event = Event::PurchaseCreated {
                purchase: purchase.id.clone(),
                account: account.clone(),
            };
            Ok(Plan::new(purchase.clone())
                .op(Operation::PurchaseCreate(PurchaseCreateOp { purchase }))
                .event(event))
        })
    }

    /// Settle a pending purchase after the gateway confirmed payment.
    ///
    /// Completes the purchase, credits coins or applies the membership,
    /// writes the ledger entry and records the voucher redemption in one
    /// commit. The voucher is honored as priced when the purchase was opened,
    /// even if it has since expired or been deactivated.
    pub fn confirm_purchase(
        &self,
        id: &PurchaseId,
        gateway_reference: &str,
    ) -> Result<Purchase, LedgerError> {
        let reference = gateway_reference.trim();
        if reference.is_empty() {
            return Err(LedgerError::invalid("gateway reference must not be empty"));
        }
        let (account, code) = self.read(|state| {
            lookup::purchase(state, id).map(|p| (p.account.clone(), p.voucher.clone().map(|v| v.code)))
        })?;
        let locks = self.locks(&account, code.as_ref());
        let _held = locks.hold();

        self.execute("confirm_purchase", |state, now| {
            let purchase = lookup::purchase(state, id)?;
            if purchase.status != Status::Pending {
                return Err(transition_error(purchase, Status::Completed));
            }
            let owner = lookup::account(state, &purchase.account)?;
            let package_name = state
                .package(&purchase.package)
                .map_or_else(|| purchase.package.to_string(), |p| p.name.clone());

            let entry_id = LedgerEntryId::generate(self.ids());
            let mut entry = LedgerEntry::new(
                entry_id.clone(),
                owner.id.clone(),
                purchase.ledger_type(),
                purchase.payment_method,
                format!("Purchased {}", package_name),
                now,
            )
            .with_usd(purchase.price)
            .with_package(purchase.package.clone())
            .with_purchase(purchase.id.clone());

            let mut completed = purchase
                .transition(Status::Completed, now)
                .map_err(|_| transition_error(purchase, Status::Completed))?;
            completed.transaction_id = Some(reference.to_string());
            completed.ledger_entry = Some(entry_id.clone());

            let mut transition = PurchaseTransitionOp {
                id: purchase.id.clone(),
                from: Status::Pending,
                to: Status::Completed,
                transaction_id: Some(reference.to_string()),
                ledger_entry: Some(entry_id.clone()),
                starts_at: None,
                expires_at: None,
                at: now,
            };

            let (mutation, delivered) = match &purchase.details {
                PurchaseDetails::Coins { coins } => {
                    let movement = wallet::credit(owner, *coins, &entry_id)?;
                    entry = entry.with_coins_received(*coins);
                    (movement.op, movement.event)
                }
                PurchaseDetails::Membership {
                    tier,
                    duration_days,
                    ..
                } => {
                    let grant = entitlement::activate(owner, *tier, *duration_days, &entry_id, now)?;
                    transition.starts_at = Some(grant.window.starts_at);
                    transition.expires_at = Some(grant.window.expires_at);
                    completed.details = PurchaseDetails::Membership {
                        tier: *tier,
                        duration_days: *duration_days,
                        starts_at: Some(grant.window.starts_at),
                        expires_at: Some(grant.window.expires_at),
                    };
                    entry = entry.with_membership(grant.window);
                    (grant.op, grant.event)
                }
            };

            let redemption = match &purchase.voucher {
                Some(applied) => {
                    entry = entry.with_voucher(applied.code.clone());
                    Some(redeem(
                        &applied.code,
                        &owner.id,
                        VoucherPurpose::Membership,
                        applied.discount.cents(),
                        Some(purchase.id.clone()),
                        &entry_id,
                        now,
                    ))
                }
                None => None,
            };

            let transitioned = Event::PurchaseTransitioned {
                purchase: purchase.id.clone(),
                account: owner.id.clone(),
                from: Status::Pending,
                to: Status::Completed,
            };
            let mut plan = Plan::new(completed)
                .op(Operation::PurchaseTransition(transition))
                .op(mutation)
                .op(Operation::LedgerAppend(LedgerAppendOp { entry }))
                .event(transitioned)
                .event(delivered);
            if let Some((usage, event)) = redemption {
                plan = plan.op(redeem_op(usage)).event(event);
            }
            Ok(plan)
        })
    }

    /// The gateway reported a failed payment
    pub fn fail_purchase(&self, id: &PurchaseId) -> Result<Purchase, LedgerError> {
        self.settle_without_delivery(id, Status::Failed)
    }

    /// The customer abandoned the payment
    pub fn cancel_purchase(&self, id: &PurchaseId) -> Result<Purchase, LedgerError> {
        self.settle_without_delivery(id, Status::Cancelled)
    }

    fn settle_without_delivery(&self, id: &PurchaseId, to: Status) -> Result<Purchase, LedgerError> {
        self.execute("settle_purchase", |state, now| {
            let purchase = lookup::purchase(state, id)?;
            let settled = purchase
                .transition(to, now)
                .map_err(|_| transition_error(purchase, to))?;
            let event = Event::PurchaseTransitioned {
                purchase: purchase.id.clone(),
                account: purchase.account.clone(),
                from: purchase.status,
                to,
            };
            Ok(Plan::new(settled)
                .op(Operation::PurchaseTransition(PurchaseTransitionOp {
                    id: purchase.id.clone(),
                    from: purchase.status,
                    to,
                    transaction_id: None,
                    ledger_entry: None,
                    starts_at: None,
                    expires_at: None,
                    at: now,
                }))
                .event(event))
        })
    }

    /// Mark a completed purchase refunded, together with its ledger entry.
    ///
    /// Only the status changes: delivered coins and membership time stay
    /// with the account, and the redemption row stays counted.
    pub fn refund_purchase(&self, id: &PurchaseId) -> Result<Purchase, LedgerError> {
        self.execute("refund_purchase", |state, now| {
            let purchase = lookup::purchase(state, id)?;
            let refunded = purchase
                .transition(Status::Refunded, now)
                .map_err(|_| transition_error(purchase, Status::Refunded))?;
            let mut plan = Plan::new(refunded).op(Operation::PurchaseTransition(
                PurchaseTransitionOp {
                    id: purchase.id.clone(),
                    from: Status::Completed,
                    to: Status::Refunded,
                    transaction_id: None,
                    ledger_entry: None,
                    starts_at: None,
                    expires_at: None,
                    at: now,
                },
            ));
            if let Some(entry) = &purchase.ledger_entry {
                plan = plan.op(Operation::LedgerTransition(LedgerTransitionOp {
                    id: entry.clone(),
                    from: Status::Completed,
                    to: Status::Refunded,
                    at: now,
                }));
            }
            Ok(plan.event(Event::PurchaseTransitioned {
                purchase: purchase.id.clone(),
                account: purchase.account.clone(),
                from: Status::Completed,
                to: Status::Refunded,
            }))
        })
    }

    pub fn purchase(&self, id: &PurchaseId) -> Result<Purchase, LedgerError> {
        self.read(|state| lookup::purchase(state, id).cloned())
    }

    /// An account's purchases, oldest first
    pub fn purchases_for(&self, account: &AccountId) -> Result<Vec<Purchase>, LedgerError> {
        self.read(|state| {
            lookup::account(state, account)?;
            Ok(state.purchases_for(account).into_iter().cloned().collect())
        })
    }

    /// Buy permanent access to one ebook or chapter with coins.
    ///
    /// Vouchers apply to ebooks only and discount the coin price.
    pub fn unlock_item(
        &self,
        account: &AccountId,
        item: &ItemRef,
        price_coins: u64,
        voucher: Option<&str>,
    ) -> Result<UnlockReceipt, LedgerError> {
        if price_coins == 0 {
            return Err(LedgerError::invalid("free items do not need unlocking"));
        }
        let code = voucher.map(parse_code).transpose()?;
        if code.is_some() && item.kind != ItemKind::Ebook {
            return Err(LedgerError::invalid("vouchers can only be applied to ebooks"));
        }
        let locks = self.locks(account, code.as_ref());
        let _held = locks.hold();

        self.execute("unlock_item", |state, now| {
            let owner = lookup::account(state, account)?;
            if state.has_unlock(account, item) {
                return Err(LedgerError::AlreadyUnlocked { item: item.clone() });
            }

            let discount = match &code {
                Some(code) => usable(state, code, account, VoucherPurpose::Ebook, now)?
                    .calculate_discount(price_coins),
                None => 0,
            };
            let price = price_coins - discount;
            if price > owner.coin_balance {
                return Err(LedgerError::InsufficientFunds {
                    balance: owner.coin_balance,
                    required: price,
                });
            }

            let entry_id = LedgerEntryId::generate(self.ids());
            let entry_type = match item.kind {
                ItemKind::Ebook => LedgerType::EbookPurchase,
                ItemKind::Chapter => LedgerType::ChapterPurchase,
            };
            let mut entry = LedgerEntry::new(
                entry_id.clone(),
                account.clone(),
                entry_type,
                PaymentMethod::Coins,
                format!("Unlocked {}", item),
                now,
            )
            .with_coins_spent(price)
            .with_item(item.clone());
            if let Some(code) = &code {
                entry = entry.with_voucher(code.clone());
            }

            let mut plan = Plan::new(UnlockReceipt {
                item: item.clone(),
                entry: entry_id.clone(),
                price_paid: price,
                discount,
                balance: owner.coin_balance - price,
            });
            if price > 0 {
                let movement = wallet::debit(owner, price, &entry_id)?;
                plan = plan.op(movement.op).event(movement.event);
            }
            plan = plan
                .op(Operation::UnlockCreate(UnlockCreateOp {
                    account: account.clone(),
                    item: item.clone(),
                }))
                .op(Operation::LedgerAppend(LedgerAppendOp { entry }))
                .event(Event::ItemUnlocked {
                    account: account.clone(),
                    item: item.clone(),
                    entry: entry_id.clone(),
                });
            if let Some(code) = &code {
                let (usage, event) = redeem(
                    code,
                    account,
                    VoucherPurpose::Ebook,
                    discount,
                    None,
                    &entry_id,
                    now,
                );
                plan = plan.op(redeem_op(usage)).event(event);
            }
            Ok(plan)
        })
    }
}

#[cfg(test)]
#[path = "purchases_tests.rs"]
mod tests;
