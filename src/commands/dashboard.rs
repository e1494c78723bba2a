// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::MoneyDisplay;
use crate::currency::CurrencyService;
use crate::dashboard::{get_dashboard_stats, get_public_view};
use crate::store::SqliteStore;
use crate::utils::{fmt_count, maybe_print_json, parse_range, pretty_table};

pub fn handle(conn: &Connection, fx: &CurrencyService, sub: &clap::ArgMatches) -> Result<()> {
    let stats = get_dashboard_stats(&SqliteStore::new(conn))?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
        return Ok(());
    }
    let money = MoneyDisplay::from_args(conn, fx, sub)?;
    let totals = vec![
        vec!["Clients".to_string(), stats.total_clients.to_string()],
        vec!["Total topup".to_string(), money.show(stats.total_budget)?],
        vec!["Total spend".to_string(), money.show(stats.total_spend)?],
        vec!["Reports".to_string(), stats.total_reports.to_string()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], totals));

    let mut recent = Vec::new();
    for a in stats.recent_activity {
        recent.push(vec![
            a.date.to_string(),
            a.client,
            a.kind.to_string(),
            money.show(a.amount)?,
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Date", "Client", "Type", "Amount"], recent)
    );
    Ok(())
}

/// Read-only client view resolved from an access token.
pub fn view(conn: &Connection, fx: &CurrencyService, sub: &clap::ArgMatches) -> Result<()> {
    let token = sub.get_one::<String>("token").unwrap().trim();
    let range = parse_range(sub.get_one::<String>("from"), sub.get_one::<String>("to"))?;
    let v = get_public_view(&SqliteStore::new(conn), token, range)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &v)? {
        return Ok(());
    }

    let money = MoneyDisplay::from_args(conn, fx, sub)?;
    match &v.client.company {
        Some(company) => println!("{} ({})", v.client.name, company),
        None => println!("{}", v.client.name),
    }
    let remaining = if v.balance.is_overdrawn() {
        format!("{} (overdrawn)", money.show(v.balance.remaining_balance)?)
    } else {
        money.show(v.balance.remaining_balance)?
    };
    let balance = vec![
        vec!["Topup".to_string(), money.show(v.balance.total_topup)?],
        vec!["Fee 5%".to_string(), money.show(v.balance.vendor_fee)?],
        vec!["Usable".to_string(), money.show(v.balance.usable_balance)?],
        vec!["Spend".to_string(), money.show(v.total_spend_all_time)?],
        vec!["Remaining".to_string(), remaining],
    ];
    println!("{}", pretty_table(&["Balance", "Value"], balance));

    let mut reports = Vec::new();
    for r in &v.reports {
        reports.push(vec![
            r.date.to_string(),
            r.account_id.clone(),
            money.show(r.spend)?,
            fmt_count(r.clicks),
            fmt_count(r.impressions),
            fmt_count(r.conversions),
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["Date", "Account", "Spend", "Clicks", "Impr.", "Conv."],
            reports
        )
    );

    let mut budgets = Vec::new();
    for b in &v.budgets {
        budgets.push(vec![
            b.date.to_string(),
            b.kind.to_string(),
            money.show(b.amount)?,
            b.note.clone().unwrap_or_default(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Date", "Type", "Amount", "Note"], budgets)
    );
    Ok(())
}
