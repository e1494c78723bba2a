// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::currency::{
    Currency, CurrencyService, format_currency, format_currency_compact, supported_currencies,
};
use crate::utils::{fmt_money, get_display_currency, parse_decimal, pretty_table, set_display_currency};

fn currency_arg(sub: &clap::ArgMatches, key: &str) -> Result<Currency> {
    Ok(sub.get_one::<String>(key).unwrap().parse::<Currency>()?)
}

pub fn handle(conn: &Connection, fx: &CurrencyService, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("rate", sub)) => {
            let from = currency_arg(sub, "from")?;
            let to = currency_arg(sub, "to")?;
            let rate = fx.get_exchange_rate(from, to)?;
            println!("1 {} = {} {}", from, rate.normalize(), to);
        }
        Some(("convert", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let from = currency_arg(sub, "from")?;
            let to = currency_arg(sub, "to")?;
            let res = fx.convert_currency(amount, from, to)?;
            println!("{} -> {}", fmt_money(amount, from)?, fmt_money(res, to)?);
        }
        Some(("format", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let code = sub.get_one::<String>("currency").unwrap();
            let out = if sub.get_flag("compact") {
                format_currency_compact(amount, code)?
            } else {
                format_currency(amount, code)?
            };
            println!("{}", out);
        }
        Some(("preload", _)) => {
            let warmed = fx.preload_exchange_rates();
            let mut data = Vec::new();
            for r in fx.cache().snapshot() {
                data.push(vec![
                    r.from.to_string(),
                    r.to.to_string(),
                    r.rate.normalize().to_string(),
                    r.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                ]);
            }
            println!("Resolved {} currency pairs", warmed);
            println!(
                "{}",
                pretty_table(&["From", "To", "Rate", "Fetched at"], data)
            );
        }
        Some(("set-display", sub)) => {
            let ccy = currency_arg(sub, "currency")?;
            set_display_currency(conn, ccy)?;
            println!("Display currency set to {}", ccy);
        }
        Some(("currencies", _)) => {
            let current = get_display_currency(conn)?;
            let data = supported_currencies()
                .into_iter()
                .map(|c| {
                    vec![
                        c.code.to_string(),
                        c.symbol.to_string(),
                        c.name.to_string(),
                        c.locale.to_string(),
                        c.fraction_digits.to_string(),
                        if c.code == current { "*" } else { "" }.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["Code", "Symbol", "Name", "Locale", "Digits", "Display"],
                    data
                )
            );
        }
        _ => {}
    }
    Ok(())
}
