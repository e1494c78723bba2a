// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use super::MoneyDisplay;
use crate::currency::CurrencyService;
use crate::dashboard::get_budget_summary;
use crate::ledger::{usable_balance, vendor_fee};
use crate::models::{BudgetFilter, BudgetKind, ClientScope};
use crate::store::{SqliteStore, Store};
use crate::utils::{ensure_client, maybe_print_json, parse_amount, parse_date, pretty_table};

pub fn handle(conn: &Connection, fx: &CurrencyService, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, fx, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_budget(conn, id)?;
            println!("Removed budget entry {}", id);
        }
        Some(("summary", sub)) => summary(conn, fx, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn add_budget(
    conn: &Connection,
    client_id: i64,
    date: NaiveDate,
    kind: BudgetKind,
    amount: Decimal,
    note: Option<&str>,
) -> Result<i64> {
    ensure_client(conn, client_id)?;
    conn.execute(
        "INSERT INTO budgets(client_id, date, kind, amount, note) VALUES (?1,?2,?3,?4,?5)",
        params![client_id, date.to_string(), kind.as_str(), amount.to_string(), note],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_budget(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
    if n == 0 {
        bail!("Budget entry {} not found", id);
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let client_id = *sub.get_one::<i64>("client").unwrap();
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let kind = sub
        .get_one::<String>("kind")
        .unwrap()
        .parse::<BudgetKind>()
        .map_err(anyhow::Error::msg)?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.as_str());
    let id = add_budget(conn, client_id, date, kind, amount, note)?;
    println!(
        "Recorded {} of {} for client {} on {} (id {})",
        kind, amount, client_id, date, id
    );
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let date = sub
        .get_one::<String>("date")
        .map(|s| parse_date(s))
        .transpose()?
        .map(|d| d.to_string());
    let kind = sub
        .get_one::<String>("kind")
        .map(|s| s.parse::<BudgetKind>().map_err(anyhow::Error::msg))
        .transpose()?;
    let amount = sub
        .get_one::<String>("amount")
        .map(|s| parse_amount(s))
        .transpose()?
        .map(|d| d.to_string());
    let note = sub.get_one::<String>("note");

    let n = conn
        .execute(
            "UPDATE budgets SET
                date=COALESCE(?2, date),
                kind=COALESCE(?3, kind),
                amount=COALESCE(?4, amount),
                note=COALESCE(?5, note)
             WHERE id=?1",
            params![id, date, kind.map(|k| k.as_str()), amount, note],
        )
        .with_context(|| format!("Failed to update budget entry {}", id))?;
    if n == 0 {
        bail!("Budget entry {} not found", id);
    }
    println!("Updated budget entry {}", id);
    Ok(())
}

fn list(conn: &Connection, fx: &CurrencyService, sub: &clap::ArgMatches) -> Result<()> {
    let scope = sub
        .get_one::<String>("client")
        .map(|s| s.parse::<ClientScope>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    let store = SqliteStore::new(conn);
    let entries = store.find_budget_entries(&BudgetFilter {
        scope,
        ..Default::default()
    })?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &entries)? {
        return Ok(());
    }

    let names: std::collections::HashMap<i64, String> = store
        .find_clients(scope)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let money = MoneyDisplay::from_args(conn, fx, sub)?;
    let mut data = Vec::new();
    for e in entries {
        // Fee columns only mean something for topups.
        let (fee, usable) = if e.kind == BudgetKind::Topup {
            (money.show(vendor_fee(e.amount))?, money.show(usable_balance(e.amount))?)
        } else {
            ("-".to_string(), "-".to_string())
        };
        data.push(vec![
            e.id.to_string(),
            e.date.to_string(),
            names.get(&e.client_id).cloned().unwrap_or_default(),
            e.kind.to_string(),
            money.show(e.amount)?,
            fee,
            usable,
            e.note.unwrap_or_default(),
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Client", "Type", "Amount", "Fee 5%", "Usable", "Note"],
            data
        )
    );
    Ok(())
}

fn summary(conn: &Connection, fx: &CurrencyService, sub: &clap::ArgMatches) -> Result<()> {
    let client_id = *sub.get_one::<i64>("client").unwrap();
    let s = get_budget_summary(&SqliteStore::new(conn), client_id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let money = MoneyDisplay::from_args(conn, fx, sub)?;
    let balance = if s.sisa_saldo.is_sign_negative() && !s.sisa_saldo.is_zero() {
        format!("{} (overdrawn)", money.show(s.sisa_saldo)?)
    } else {
        money.show(s.sisa_saldo)?
    };
    let data = vec![
        vec!["Total topup".to_string(), money.show(s.total_topup)?],
        vec!["Total spend".to_string(), money.show(s.total_spend)?],
        vec!["Remaining balance".to_string(), balance],
        vec!["Clicks".to_string(), s.total_clicks.to_string()],
        vec!["Impressions".to_string(), s.total_impressions.to_string()],
        vec!["Conversions".to_string(), s.total_conversions.to_string()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], data));
    Ok(())
}
