// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State lookups that fail with `NotFound`

use crate::error::LedgerError;
use tally_core::{Account, AccountId, Package, PackageId, Purchase, PurchaseId};
use tally_storage::MaterializedState;

pub(crate) fn account<'a>(
    state: &'a MaterializedState,
    id: &AccountId,
) -> Result<&'a Account, LedgerError> {
    state
        .account(id)
        .ok_or_else(|| LedgerError::not_found("account", id))
}

pub(crate) fn package<'a>(
    state: &'a MaterializedState,
    id: &PackageId,
) -> Result<&'a Package, LedgerError> {
    state
        .package(id)
        .ok_or_else(|| LedgerError::not_found("package", id))
}

pub(crate) fn purchase<'a>(
    state: &'a MaterializedState,
    id: &PurchaseId,
) -> Result<&'a Purchase, LedgerError> {
    state
        .purchase(id)
        .ok_or_else(|| LedgerError::not_found("purchase", id))
}
