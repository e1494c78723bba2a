// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::FEE_RATE;
use crate::errors::StoreResult;
use crate::models::{BudgetFilter, ClientScope, DateRange};
use crate::store::Store;

/// Gross topup, fee and balance for one client or for everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetAggregate {
    pub total_topup: Decimal,
    pub vendor_fee: Decimal,
    pub usable_balance: Decimal,
    pub total_spend: Decimal,
    pub remaining_balance: Decimal,
}

impl BudgetAggregate {
    pub fn new(total_topup: Decimal, total_spend: Decimal) -> Self {
        let usable = usable_balance(total_topup);
        Self {
            total_topup,
            vendor_fee: total_topup - usable,
            usable_balance: usable,
            total_spend,
            remaining_balance: usable - total_spend,
        }
    }

    pub fn is_overdrawn(&self) -> bool {
        self.remaining_balance.is_sign_negative() && !self.remaining_balance.is_zero()
    }
}

/// Sum of `topup` entries only; bonus and adjustment rows stay out of the
/// balance math.
pub fn total_topup<S: Store + ?Sized>(
    store: &S,
    scope: ClientScope,
    range: DateRange,
) -> StoreResult<Decimal> {
    store.sum_budget_amount(&BudgetFilter::topups(scope, range))
}

pub fn usable_balance(total_topup: Decimal) -> Decimal {
    total_topup * (Decimal::ONE - FEE_RATE)
}

pub fn vendor_fee(amount: Decimal) -> Decimal {
    amount * FEE_RATE
}

/// All-time post-fee balance minus `total_spend`. May be negative.
pub fn remaining_balance<S: Store + ?Sized>(
    store: &S,
    scope: ClientScope,
    total_spend: Decimal,
) -> StoreResult<Decimal> {
    let topup = total_topup(store, scope, DateRange::all_time())?;
    Ok(usable_balance(topup) - total_spend)
}
