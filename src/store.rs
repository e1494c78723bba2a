// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side storage contract consumed by the aggregators, and its SQLite
//! implementation.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::errors::{StoreError, StoreResult};
use crate::models::{
    AdReportEntry, BudgetEntry, BudgetFilter, BudgetKind, Client, ClientScope, RecentActivity,
    ReportFilter,
};
use crate::performance::ReportAggregate;

pub trait Store {
    fn find_clients(&self, scope: ClientScope) -> StoreResult<Vec<Client>>;

    fn find_client_by_token(&self, token: &str) -> StoreResult<Option<Client>>;

    fn find_budget_entries(&self, filter: &BudgetFilter) -> StoreResult<Vec<BudgetEntry>>;

    fn find_report_entries(&self, filter: &ReportFilter) -> StoreResult<Vec<AdReportEntry>>;

    fn count_clients(&self) -> StoreResult<u64>;

    fn recent_budget_entries(&self, limit: usize) -> StoreResult<Vec<RecentActivity>>;

    fn sum_budget_amount(&self, filter: &BudgetFilter) -> StoreResult<Decimal> {
        Ok(self
            .find_budget_entries(filter)?
            .iter()
            .map(|b| b.amount)
            .sum())
    }

    fn sum_report_fields(&self, filter: &ReportFilter) -> StoreResult<ReportAggregate> {
        Ok(ReportAggregate::from_rows(&self.find_report_entries(filter)?))
    }

    fn count_reports(&self, filter: &ReportFilter) -> StoreResult<u64> {
        Ok(self.find_report_entries(filter)?.len() as u64)
    }
}

/// Store backed by the adledger SQLite schema.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

fn corrupt(table: &'static str, detail: String) -> StoreError {
    StoreError::Corrupt { table, detail }
}

fn parse_date_col(table: &'static str, raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| corrupt(table, format!("invalid date '{}'", raw)))
}

fn parse_decimal_col(table: &'static str, raw: &str) -> StoreResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| corrupt(table, format!("invalid amount '{}'", raw)))
}

fn parse_count_col(table: &'static str, raw: Option<i64>) -> StoreResult<Option<u64>> {
    raw.map(|v| u64::try_from(v).map_err(|_| corrupt(table, format!("negative count {}", v))))
        .transpose()
}

const CLIENT_COLUMNS: &str =
    "id, name, email, phone, company, is_active, access_token, created_at";

fn client_from_row(r: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        phone: r.get(3)?,
        company: r.get(4)?,
        is_active: r.get::<_, i64>(5)? != 0,
        access_token: r.get(6)?,
        created_at: r.get(7)?,
    })
}

/// Appends `client_id` and date predicates, pushing their bind values.
fn push_scope_and_range(
    sql: &mut String,
    params_vec: &mut Vec<String>,
    scope: ClientScope,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) {
    if let Some(id) = scope.client_id() {
        sql.push_str(" AND client_id=?");
        params_vec.push(id.to_string());
    }
    if let Some(from) = from {
        sql.push_str(" AND date>=?");
        params_vec.push(from.to_string());
    }
    if let Some(to) = to {
        sql.push_str(" AND date<=?");
        params_vec.push(to.to_string());
    }
}

impl Store for SqliteStore<'_> {
    fn find_clients(&self, scope: ClientScope) -> StoreResult<Vec<Client>> {
        let mut sql = format!("SELECT {} FROM clients WHERE 1=1", CLIENT_COLUMNS);
        let mut params_vec: Vec<String> = Vec::new();
        if let Some(id) = scope.client_id() {
            sql.push_str(" AND id=?");
            params_vec.push(id.to_string());
        }
        sql.push_str(" ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), client_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn find_client_by_token(&self, token: &str) -> StoreResult<Option<Client>> {
        let sql = format!(
            "SELECT {} FROM clients WHERE access_token=?1",
            CLIENT_COLUMNS
        );
        let client = self
            .conn
            .query_row(&sql, params![token], client_from_row)
            .optional()?;
        Ok(client)
    }

    fn find_budget_entries(&self, filter: &BudgetFilter) -> StoreResult<Vec<BudgetEntry>> {
        let mut sql = String::from(
            "SELECT id, client_id, date, kind, amount, note, created_at FROM budgets WHERE 1=1",
        );
        let mut params_vec: Vec<String> = Vec::new();
        push_scope_and_range(
            &mut sql,
            &mut params_vec,
            filter.scope,
            filter.range.from,
            filter.range.to,
        );
        if let Some(kind) = filter.kind {
            sql.push_str(" AND kind=?");
            params_vec.push(kind.as_str().to_string());
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let date: String = r.get(2)?;
            let kind: String = r.get(3)?;
            let amount: String = r.get(4)?;
            out.push(BudgetEntry {
                id: r.get(0)?,
                client_id: r.get(1)?,
                date: parse_date_col("budgets", &date)?,
                kind: kind.parse::<BudgetKind>().map_err(|e| corrupt("budgets", e))?,
                amount: parse_decimal_col("budgets", &amount)?,
                note: r.get(5)?,
                created_at: r.get(6)?,
            });
        }
        Ok(out)
    }

    fn find_report_entries(&self, filter: &ReportFilter) -> StoreResult<Vec<AdReportEntry>> {
        let mut sql = String::from(
            "SELECT id, client_id, date, account_id, spend, clicks, impressions, conversions
             FROM ad_reports WHERE 1=1",
        );
        let mut params_vec: Vec<String> = Vec::new();
        push_scope_and_range(
            &mut sql,
            &mut params_vec,
            filter.scope,
            filter.range.from,
            filter.range.to,
        );
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let date: String = r.get(2)?;
            let spend: String = r.get(4)?;
            out.push(AdReportEntry {
                id: r.get(0)?,
                client_id: r.get(1)?,
                date: parse_date_col("ad_reports", &date)?,
                account_id: r.get(3)?,
                spend: parse_decimal_col("ad_reports", &spend)?,
                clicks: parse_count_col("ad_reports", r.get(5)?)?,
                impressions: parse_count_col("ad_reports", r.get(6)?)?,
                conversions: parse_count_col("ad_reports", r.get(7)?)?,
            });
        }
        Ok(out)
    }

    fn count_clients(&self) -> StoreResult<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clients", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    fn recent_budget_entries(&self, limit: usize) -> StoreResult<Vec<RecentActivity>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id, c.name, b.amount, b.kind, b.date
             FROM budgets b JOIN clients c ON b.client_id=c.id
             ORDER BY b.created_at DESC, b.id DESC
             LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::with_capacity(limit);
        while let Some(r) = rows.next()? {
            let amount: String = r.get(2)?;
            let kind: String = r.get(3)?;
            let date: String = r.get(4)?;
            out.push(RecentActivity {
                id: r.get(0)?,
                client: r.get(1)?,
                amount: parse_decimal_col("budgets", &amount)?,
                kind: kind.parse::<BudgetKind>().map_err(|e| corrupt("budgets", e))?,
                date: parse_date_col("budgets", &date)?,
            });
        }
        Ok(out)
    }

    fn count_reports(&self, filter: &ReportFilter) -> StoreResult<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM ad_reports WHERE 1=1");
        let mut params_vec: Vec<String> = Vec::new();
        push_scope_and_range(
            &mut sql,
            &mut params_vec,
            filter.scope,
            filter.range.from,
            filter.range.to,
        );
        let n: i64 = self.conn.query_row(
            &sql,
            rusqlite::params_from_iter(params_vec.iter()),
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }
}
