// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::MoneyDisplay;
use crate::analytics::{AnalyticsCache, AnalyticsEngine, AnalyticsPayload};
use crate::clock::SystemClock;
use crate::config::DEFAULT_ANALYTICS_DAYS;
use crate::currency::CurrencyService;
use crate::models::ClientScope;
use crate::performance::CostRatio;
use crate::store::SqliteStore;
use crate::utils::{fmt_percent, maybe_print_json, pretty_table};

pub fn handle(
    conn: &Connection,
    fx: &CurrencyService,
    cache: &AnalyticsCache,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let scope = sub
        .get_one::<String>("client")
        .unwrap()
        .parse::<ClientScope>()
        .map_err(anyhow::Error::msg)?;
    let days = sub
        .get_one::<u32>("days")
        .copied()
        .unwrap_or(DEFAULT_ANALYTICS_DAYS);

    let store = SqliteStore::new(conn);
    let clock = SystemClock;
    let response = AnalyticsEngine::new(&store, &clock, cache).get_analytics(scope, days)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &response)? {
        return Ok(());
    }

    let money = MoneyDisplay::from_args(conn, fx, sub)?;
    print_payload(&money, &response.data)
}

fn cpc_cell(money: &MoneyDisplay<'_>, ratio: CostRatio) -> Result<String> {
    match ratio {
        CostRatio::Finite(v) => money.show(v),
        CostRatio::Undefined => Ok("—".to_string()),
    }
}

fn print_payload(money: &MoneyDisplay<'_>, d: &AnalyticsPayload) -> Result<()> {
    println!(
        "Analytics for client {} from {} to {} ({} days)",
        d.client, d.from, d.to, d.days
    );
    let overview = vec![
        vec!["Spend".to_string(), money.show(d.total_spend)?],
        vec!["Topup".to_string(), money.show(d.total_budget)?],
        vec![
            "Budget utilization".to_string(),
            fmt_percent(d.budget_utilization),
        ],
        vec!["Reports".to_string(), d.report_count.to_string()],
        vec!["Clicks".to_string(), d.total_clicks.to_string()],
        vec!["Impressions".to_string(), d.total_impressions.to_string()],
        vec!["Conversions".to_string(), d.total_conversions.to_string()],
        vec!["Avg CPC".to_string(), money.show(d.avg_cpc)?],
        vec!["Avg CTR".to_string(), fmt_percent(d.avg_ctr)],
        vec!["CPA".to_string(), money.show_opt(d.cpa)?],
        vec!["Conversion rate".to_string(), fmt_percent(d.conversion_rate)],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], overview));

    let mut by_client = Vec::new();
    for c in &d.spend_by_client {
        let cpc = cpc_cell(money, c.cost_per_click())?;
        by_client.push(vec![
            c.client_name.clone(),
            money.show(c.spend)?,
            c.clicks.to_string(),
            c.impressions.to_string(),
            c.conversions.to_string(),
            fmt_percent(c.ctr_score()),
            cpc,
        ]);
    }
    println!(
        "{}",
        pretty_table(
            &["Client", "Spend", "Clicks", "Impr.", "Conv.", "CTR", "CPC"],
            by_client
        )
    );

    let mut by_month = Vec::new();
    for m in &d.spend_by_month {
        by_month.push(vec![
            m.label.clone(),
            money.show(m.spend)?,
            m.clicks.to_string(),
            m.conversions.to_string(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Month", "Spend", "Clicks", "Conv."], by_month)
    );

    let top = &d.top_performers;
    let leaders = vec![
        vec![
            "Best CTR".to_string(),
            top.best_ctr.client_name.clone(),
            fmt_percent(top.best_ctr.ctr_score()),
        ],
        vec![
            "Lowest CPC".to_string(),
            top.best_cpc.client_name.clone(),
            cpc_cell(money, top.best_cpc.cost_per_click())?,
        ],
        vec![
            "Most conversions".to_string(),
            top.most_conversions.client_name.clone(),
            top.most_conversions.conversions.to_string(),
        ],
    ];
    println!("{}", pretty_table(&["Award", "Client", "Value"], leaders));
    Ok(())
}
