// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::currency::{BASE_CURRENCY, Currency, format_currency};
use crate::models::DateRange;

const UA: &str = concat!(
    "adledger/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/adledger)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Money inputs: decimal and not negative.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d.is_sign_negative() && !d.is_zero() {
        return Err(anyhow!("Amount '{}' must not be negative", s));
    }
    Ok(d)
}

/// Optional counters: blank means "not tracked". Values must fit the
/// signed INTEGER column they are stored in.
pub fn parse_count(s: &str) -> Result<Option<u64>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let n = s
        .parse::<u64>()
        .with_context(|| format!("Invalid count '{}', expected a whole number >= 0", s))?;
    count_column(Some(n))?;
    Ok(Some(n))
}

/// Converts a counter to its SQLite INTEGER value.
pub fn count_column(n: Option<u64>) -> Result<Option<i64>> {
    n.map(|v| i64::try_from(v).with_context(|| format!("Count {} is too large", v)))
        .transpose()
}

pub fn parse_range(from: Option<&String>, to: Option<&String>) -> Result<DateRange> {
    Ok(DateRange {
        from: from.map(|s| parse_date(s)).transpose()?,
        to: to.map(|s| parse_date(s)).transpose()?,
    })
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn ensure_client(conn: &Connection, id: i64) -> Result<()> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM clients WHERE id=?1", params![id], |r| {
            r.get(0)
        })
        .optional()?;
    found
        .map(|_| ())
        .with_context(|| format!("Client {} not found", id))
}

pub fn get_display_currency(conn: &Connection) -> Result<Currency> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='display_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(code) => Ok(code.parse::<Currency>()?),
        None => Ok(BASE_CURRENCY),
    }
}

pub fn set_display_currency(conn: &Connection, ccy: Currency) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('display_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy.code()],
    )?;
    Ok(())
}

pub fn fmt_money(d: Decimal, ccy: Currency) -> Result<String> {
    Ok(format_currency(d, ccy.code())?)
}

pub fn fmt_percent(d: Decimal) -> String {
    format!("{:.2}%", d.round_dp(2))
}

pub fn fmt_count(n: Option<u64>) -> String {
    n.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_counts_are_not_tracked() {
        assert_eq!(parse_count("").unwrap(), None);
        assert_eq!(parse_count(" 12 ").unwrap(), Some(12));
        assert!(parse_count("-3").is_err());
    }

    #[test]
    fn counts_must_fit_the_integer_column() {
        assert_eq!(
            parse_count("9223372036854775807").unwrap(),
            Some(i64::MAX as u64)
        );
        assert!(parse_count("9223372036854775808").is_err());
        assert!(count_column(Some(u64::MAX)).is_err());
        assert_eq!(count_column(None).unwrap(), None);
    }

    #[test]
    fn amounts_reject_negatives() {
        assert!(parse_amount("-1").is_err());
        assert_eq!(parse_amount(" 10.50 ").unwrap(), Decimal::new(1050, 2));
    }

    #[test]
    fn percents_and_counts_render_for_tables() {
        assert_eq!(fmt_percent(Decimal::new(123456, 4)), "12.35%");
        assert_eq!(fmt_count(None), "-");
        assert_eq!(fmt_money(Decimal::new(150000, 0), Currency::Idr).unwrap(), "Rp150.000");
    }
}
