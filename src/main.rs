// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use adledger::analytics::AnalyticsCache;
use adledger::config::AppConfig;
use adledger::currency::{CurrencyService, ExchangeRateApi};
use adledger::{cli, commands, db, utils};

fn main() -> Result<()> {
    adledger::init_tracing();
    let config = AppConfig::from_env();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init(&config)?;
    let fx = CurrencyService::new(Box::new(ExchangeRateApi::new(
        utils::http_client()?,
        config.exchange_rate_api_key.clone(),
    )));
    let analytics_cache = AnalyticsCache::default();

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path(&config)?.display());
        }
        Some(("client", sub)) => commands::clients::handle(&conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, &fx, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &fx, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("analytics", sub)) => {
            commands::analytics::handle(&conn, &fx, &analytics_cache, sub)?
        }
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, &fx, sub)?,
        Some(("view", sub)) => commands::dashboard::view(&conn, &fx, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&conn, &fx, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
