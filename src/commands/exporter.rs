// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{ClientScope, ReportFilter};
use crate::store::{SqliteStore, Store};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("reports", sub)) => {
            let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
            let out = sub.get_one::<String>("out").unwrap();
            let scope = sub
                .get_one::<String>("client")
                .map(|s| s.parse::<ClientScope>())
                .transpose()
                .map_err(anyhow::Error::msg)?
                .unwrap_or_default();
            let n = export_reports(conn, scope, &fmt, Path::new(out))?;
            println!("Exported {} reports to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes reports oldest first, in the same column order the importer reads.
pub fn export_reports(conn: &Connection, scope: ClientScope, fmt: &str, out: &Path) -> Result<usize> {
    let mut rows = SqliteStore::new(conn).find_report_entries(&ReportFilter {
        scope,
        ..Default::default()
    })?;
    rows.reverse();

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "client_id",
                "date",
                "account_id",
                "spend",
                "clicks",
                "impressions",
                "conversions",
            ])?;
            let opt = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
            for r in &rows {
                wtr.write_record([
                    r.client_id.to_string(),
                    r.date.to_string(),
                    r.account_id.clone(),
                    r.spend.to_string(),
                    opt(r.clicks),
                    opt(r.impressions),
                    opt(r.conversions),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(rows.len())
}
