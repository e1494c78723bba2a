// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::{Client, ClientScope};
use crate::store::{SqliteStore, Store};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = NewClient {
                name: sub.get_one::<String>("name").unwrap().trim().to_string(),
                email: sub.get_one::<String>("email").unwrap().trim().to_string(),
                phone: non_blank(sub.get_one::<String>("phone")),
                company: non_blank(sub.get_one::<String>("company")),
                is_active: !sub.get_flag("inactive"),
            };
            let client = add_client(conn, &input)?;
            println!(
                "Added client '{}' (id {}), public token {}",
                client.name, client.id, client.access_token
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let changes = ClientChanges {
                name: non_blank(sub.get_one::<String>("name")),
                email: non_blank(sub.get_one::<String>("email")),
                phone: sub.get_one::<String>("phone").map(|s| s.trim().to_string()),
                company: sub.get_one::<String>("company").map(|s| s.trim().to_string()),
                is_active: sub.get_one::<bool>("active").copied(),
            };
            update_client(conn, id, &changes)?;
            println!("Updated client {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_client(conn, id)?;
            println!("Removed client {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn non_blank(v: Option<&String>) -> Option<String> {
    v.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub is_active: Option<bool>,
}

fn email_taken(conn: &Connection, email: &str, except: Option<i64>) -> Result<bool, LedgerError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM clients WHERE lower(email)=lower(?1) AND id IS NOT ?2",
            params![email, except],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Inserts a client with a fresh random access token.
pub fn add_client(conn: &Connection, input: &NewClient) -> Result<Client, LedgerError> {
    if email_taken(conn, &input.email, None)? {
        return Err(LedgerError::DuplicateEmail(input.email.clone()));
    }
    let token = Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO clients(name, email, phone, company, is_active, access_token)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            input.name,
            input.email,
            input.phone,
            input.company,
            input.is_active as i64,
            token
        ],
    )?;
    let id = conn.last_insert_rowid();
    SqliteStore::new(conn)
        .find_clients(ClientScope::Client(id))?
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::ClientNotFound(id.to_string()))
}

pub fn update_client(conn: &Connection, id: i64, changes: &ClientChanges) -> Result<(), LedgerError> {
    if let Some(email) = &changes.email {
        if email_taken(conn, email, Some(id))? {
            return Err(LedgerError::DuplicateEmail(email.clone()));
        }
    }
    let updated = conn.execute(
        "UPDATE clients SET
            name=COALESCE(?2, name),
            email=COALESCE(?3, email),
            phone=CASE WHEN ?4 IS NULL THEN phone ELSE NULLIF(?4, '') END,
            company=CASE WHEN ?5 IS NULL THEN company ELSE NULLIF(?5, '') END,
            is_active=COALESCE(?6, is_active)
         WHERE id=?1",
        params![
            id,
            changes.name,
            changes.email,
            changes.phone,
            changes.company,
            changes.is_active.map(|b| b as i64)
        ],
    )?;
    if updated == 0 {
        return Err(LedgerError::ClientNotFound(id.to_string()));
    }
    Ok(())
}

/// Refuses while any budget entry or ad report still belongs to the client.
pub fn delete_client(conn: &Connection, id: i64) -> Result<(), LedgerError> {
    let owned: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM budgets WHERE client_id=?1)
              + (SELECT COUNT(*) FROM ad_reports WHERE client_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if owned > 0 {
        return Err(LedgerError::ClientInUse(id));
    }
    let removed = conn.execute("DELETE FROM clients WHERE id=?1", params![id])?;
    if removed == 0 {
        return Err(LedgerError::ClientNotFound(id.to_string()));
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let clients = SqliteStore::new(conn).find_clients(ClientScope::All)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &clients)? {
        return Ok(());
    }
    let rows = clients
        .into_iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name,
                c.company.unwrap_or_default(),
                c.email,
                c.phone.unwrap_or_default(),
                if c.is_active { "active" } else { "inactive" }.to_string(),
                c.access_token,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Company", "Email", "Phone", "Status", "Access Token"],
            rows
        )
    );
    Ok(())
}
