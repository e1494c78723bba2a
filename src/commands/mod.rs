// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod analytics;
pub mod budgets;
pub mod clients;
pub mod dashboard;
pub mod exporter;
pub mod fx;
pub mod importer;
pub mod reports;

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::currency::{BASE_CURRENCY, Currency, CurrencyService};
use crate::utils::{fmt_money, get_display_currency};

/// Renders base-currency amounts in the chosen display currency.
pub struct MoneyDisplay<'a> {
    fx: &'a CurrencyService,
    pub currency: Currency,
}

impl<'a> MoneyDisplay<'a> {
    pub fn new(fx: &'a CurrencyService, currency: Currency) -> Self {
        Self { fx, currency }
    }

    /// `--currency` wins over the saved display currency.
    pub fn from_args(
        conn: &Connection,
        fx: &'a CurrencyService,
        sub: &clap::ArgMatches,
    ) -> Result<Self> {
        let currency = match sub.get_one::<String>("currency") {
            Some(code) => code.parse::<Currency>()?,
            None => get_display_currency(conn)?,
        };
        Ok(Self::new(fx, currency))
    }

    pub fn show(&self, amount: Decimal) -> Result<String> {
        let converted = self
            .fx
            .convert_currency(amount, BASE_CURRENCY, self.currency)?;
        fmt_money(converted, self.currency)
    }

    pub fn show_opt(&self, amount: Option<Decimal>) -> Result<String> {
        match amount {
            Some(v) => self.show(v),
            None => Ok("—".to_string()),
        }
    }
}
