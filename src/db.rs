// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

use crate::config::AppConfig;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Adledger", "adledger"));

pub fn db_path(config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = &config.db_path {
        return Ok(path.clone());
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("adledger.sqlite"))
}

pub fn open_or_init(config: &AppConfig) -> Result<Connection> {
    let path = db_path(config)?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS clients(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        company TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        access_token TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('topup','bonus','adj')),
        amount TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
        FOREIGN KEY(client_id) REFERENCES clients(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_budgets_client_date ON budgets(client_id, date);

    CREATE TABLE IF NOT EXISTS ad_reports(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        account_id TEXT NOT NULL,
        spend TEXT NOT NULL,
        clicks INTEGER,
        impressions INTEGER,
        conversions INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(client_id) REFERENCES clients(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_ad_reports_client_date ON ad_reports(client_id, date);
    "#,
    )?;
    Ok(())
}
