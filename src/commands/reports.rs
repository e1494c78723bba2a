// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

use super::MoneyDisplay;
use crate::currency::CurrencyService;
use crate::models::{ClientScope, DateRange, ReportFilter};
use crate::performance::{self, ReportAggregate};
use crate::store::{SqliteStore, Store};
use crate::utils::{
    count_column, ensure_client, fmt_count, fmt_percent, maybe_print_json, parse_amount, parse_count,
    parse_date, parse_range, pretty_table,
};

pub fn handle(conn: &Connection, fx: &CurrencyService, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_report(conn, id)?;
            println!("Removed report {}", id);
        }
        Some(("aggregate", sub)) => aggregate(conn, fx, sub)?,
        _ => {}
    }
    Ok(())
}

/// One day of ad performance before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub client_id: i64,
    pub date: NaiveDate,
    pub account_id: String,
    pub spend: Decimal,
    pub clicks: Option<u64>,
    pub impressions: Option<u64>,
    pub conversions: Option<u64>,
}

pub fn add_report(conn: &Connection, r: &NewReport) -> Result<i64> {
    ensure_client(conn, r.client_id)?;
    conn.execute(
        "INSERT INTO ad_reports(client_id, date, account_id, spend, clicks, impressions, conversions)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            r.client_id,
            r.date.to_string(),
            r.account_id,
            r.spend.to_string(),
            count_column(r.clicks)?,
            count_column(r.impressions)?,
            count_column(r.conversions)?
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_report(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM ad_reports WHERE id=?1", params![id])?;
    if n == 0 {
        bail!("Report {} not found", id);
    }
    Ok(())
}

fn optional_count(sub: &clap::ArgMatches, key: &str) -> Result<Option<u64>> {
    match sub.get_one::<String>(key) {
        Some(s) => parse_count(s),
        None => Ok(None),
    }
}

/// A counter edit: keep (flag absent), set, or clear back to not tracked
/// (`none` or blank).
#[derive(Debug, Default, PartialEq)]
struct CountChange {
    value: Option<i64>,
    clear: bool,
}

fn count_change(sub: &clap::ArgMatches, key: &str) -> Result<CountChange> {
    match sub.get_one::<String>(key).map(|s| s.trim()) {
        None => Ok(CountChange::default()),
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("none") => Ok(CountChange {
            value: None,
            clear: true,
        }),
        Some(s) => Ok(CountChange {
            value: count_column(parse_count(s)?)?,
            clear: false,
        }),
    }
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = NewReport {
        client_id: *sub.get_one::<i64>("client").unwrap(),
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        account_id: sub.get_one::<String>("account").unwrap().trim().to_string(),
        spend: parse_amount(sub.get_one::<String>("spend").unwrap())?,
        clicks: optional_count(sub, "clicks")?,
        impressions: optional_count(sub, "impressions")?,
        conversions: optional_count(sub, "conversions")?,
    };
    let id = add_report(conn, &report)?;
    println!(
        "Logged report {} for client {} on {}",
        id, report.client_id, report.date
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
    let account = sub.get_one::<String>("account").map(|s| s.trim().to_string());
    let spend = sub
        .get_one::<String>("spend")
        .map(|s| parse_amount(s))
        .transpose()?
        .map(|d| d.to_string());
    let clicks = count_change(sub, "clicks")?;
    let impressions = count_change(sub, "impressions")?;
    let conversions = count_change(sub, "conversions")?;

    let n = conn.execute(
        "UPDATE ad_reports SET
            date=COALESCE(?2, date),
            account_id=COALESCE(?3, account_id),
            spend=COALESCE(?4, spend),
            clicks=CASE WHEN ?8 THEN NULL ELSE COALESCE(?5, clicks) END,
            impressions=CASE WHEN ?9 THEN NULL ELSE COALESCE(?6, impressions) END,
            conversions=CASE WHEN ?10 THEN NULL ELSE COALESCE(?7, conversions) END
         WHERE id=?1",
        params![
            id,
            date,
            account,
            spend,
            clicks.value,
            impressions.value,
            conversions.value,
            clicks.clear,
            impressions.clear,
            conversions.clear
        ],
    )?;
    if n == 0 {
        bail!("Report {} not found", id);
    }
    println!("Updated report {}", id);
    Ok(())
}

fn scope_arg(sub: &clap::ArgMatches) -> Result<ClientScope> {
    Ok(sub
        .get_one::<String>("client")
        .map(|s| s.parse::<ClientScope>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let scope = scope_arg(sub)?;
    let range = parse_range(sub.get_one::<String>("from"), sub.get_one::<String>("to"))?;
    let mut rows = SqliteStore::new(conn).find_report_entries(&ReportFilter::new(scope, range))?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.date.to_string(),
                r.client_id.to_string(),
                r.account_id,
                r.spend.to_string(),
                fmt_count(r.clicks),
                fmt_count(r.impressions),
                fmt_count(r.conversions),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Client", "Account", "Spend", "Clicks", "Impr.", "Conv."],
            data
        )
    );
    Ok(())
}

/// Totals plus derived ratios for a client scope and date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTotals {
    pub client: ClientScope,
    pub range: DateRange,
    #[serde(flatten)]
    pub totals: ReportAggregate,
    pub avg_cpc: Decimal,
    pub avg_ctr: Decimal,
    pub cpa: Option<Decimal>,
    pub conversion_rate: Decimal,
}

pub fn report_totals(conn: &Connection, scope: ClientScope, range: DateRange) -> Result<ReportTotals> {
    let totals = performance::aggregate(&SqliteStore::new(conn), scope, range)?;
    Ok(ReportTotals {
        client: scope,
        range,
        avg_cpc: totals.avg_cpc(),
        avg_ctr: totals.avg_ctr(),
        cpa: totals.cpa(),
        conversion_rate: totals.conversion_rate(),
        totals,
    })
}

fn aggregate(conn: &Connection, fx: &CurrencyService, sub: &clap::ArgMatches) -> Result<()> {
    let scope = scope_arg(sub)?;
    let range = parse_range(sub.get_one::<String>("from"), sub.get_one::<String>("to"))?;
    let t = report_totals(conn, scope, range)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t)? {
        return Ok(());
    }
    let money = MoneyDisplay::from_args(conn, fx, sub)?;
    let data = vec![
        vec!["Reports".to_string(), t.totals.report_count.to_string()],
        vec!["Spend".to_string(), money.show(t.totals.spend)?],
        vec!["Clicks".to_string(), t.totals.clicks.to_string()],
        vec!["Impressions".to_string(), t.totals.impressions.to_string()],
        vec!["Conversions".to_string(), t.totals.conversions.to_string()],
        vec!["Avg CPC".to_string(), money.show(t.avg_cpc)?],
        vec!["Avg CTR".to_string(), fmt_percent(t.avg_ctr)],
        vec!["CPA".to_string(), money.show_opt(t.cpa)?],
        vec!["Conversion rate".to_string(), fmt_percent(t.conversion_rate)],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], data));
    Ok(())
}
