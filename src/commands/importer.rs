// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{HashMap, hash_map::Entry};
use std::path::Path;
use tracing::info;

use crate::utils::{count_column, parse_amount, parse_count, parse_date};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("reports", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let n = import_reports(conn, Path::new(path))?;
            println!("Imported {} reports from {}", n, path);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Loads `client_id,date,account_id,spend,clicks,impressions,conversions`
/// rows in one transaction. Blank counters are stored as not tracked; any bad
/// row aborts the whole file.
pub fn import_reports(conn: &mut Connection, path: &Path) -> Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;

    let tx = conn.transaction()?;
    let mut known_clients: HashMap<i64, bool> = HashMap::new();
    let mut count = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let rec = result?;
        let client_raw = rec.get(0).context("client_id missing")?.trim();
        let date_raw = rec.get(1).context("date missing")?.trim();
        let account = rec.get(2).context("account_id missing")?.trim().to_string();
        let spend_raw = rec.get(3).context("spend missing")?.trim();

        let client_id: i64 = client_raw
            .parse()
            .with_context(|| format!("line {}: invalid client_id '{}'", line, client_raw))?;
        let date = parse_date(date_raw).with_context(|| format!("line {}", line))?;
        let spend = parse_amount(spend_raw).with_context(|| format!("line {}", line))?;
        let clicks = parse_count(rec.get(4).unwrap_or("")).with_context(|| format!("line {}", line))?;
        let impressions =
            parse_count(rec.get(5).unwrap_or("")).with_context(|| format!("line {}", line))?;
        let conversions =
            parse_count(rec.get(6).unwrap_or("")).with_context(|| format!("line {}", line))?;

        let exists = match known_clients.entry(client_id) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let found: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM clients WHERE id=?1",
                        params![client_id],
                        |r| r.get(0),
                    )
                    .optional()?;
                *entry.insert(found.is_some())
            }
        };
        if !exists {
            anyhow::bail!("line {}: client {} not found", line, client_id);
        }

        tx.execute(
            "INSERT INTO ad_reports(client_id, date, account_id, spend, clicks, impressions, conversions) \
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                client_id,
                date.to_string(),
                account,
                spend.to_string(),
                count_column(clicks)?,
                count_column(impressions)?,
                count_column(conversions)?
            ],
        )?;
        count += 1;
    }
    tx.commit()?;
    info!(rows = count, path = %path.display(), "imported ad reports");
    Ok(count)
}
