// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use adledger::analytics::{AnalyticsCache, AnalyticsEngine, AnalyticsKey};
use adledger::clock::FixedClock;
use adledger::db;
use adledger::errors::{AnalyticsError, StoreError, StoreResult};
use adledger::models::{
    AdReportEntry, BudgetEntry, BudgetFilter, Client, ClientScope, RecentActivity, ReportFilter,
};
use adledger::store::{SqliteStore, Store};
use chrono::{Duration, TimeZone, Utc};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for (id, name) in [(1, "Toko A"), (2, "Toko B"), (3, "Toko C")] {
        conn.execute(
            "INSERT INTO clients(id, name, email, access_token) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, format!("c{}@example.com", id), format!("tok-{}", id)],
        )
        .unwrap();
    }
    conn
}

fn report(
    conn: &Connection,
    client_id: i64,
    date: &str,
    spend: &str,
    clicks: Option<i64>,
    impressions: Option<i64>,
    conversions: Option<i64>,
) {
    conn.execute(
        "INSERT INTO ad_reports(client_id, date, account_id, spend, clicks, impressions, conversions)
         VALUES (?1, ?2, 'act', ?3, ?4, ?5, ?6)",
        params![client_id, date, spend, clicks, impressions, conversions],
    )
    .unwrap();
}

fn topup(conn: &Connection, client_id: i64, date: &str, amount: &str) {
    conn.execute(
        "INSERT INTO budgets(client_id, date, kind, amount) VALUES (?1, ?2, 'topup', ?3)",
        params![client_id, date, amount],
    )
    .unwrap();
}

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap())
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn totals_ratios_and_utilization_cover_the_window() {
    let conn = setup();
    report(&conn, 1, "2025-01-10", "300", Some(100), Some(1000), Some(5));
    report(&conn, 2, "2025-01-12", "100", Some(50), Some(2000), None);
    report(&conn, 2, "2024-12-01", "999", Some(1), Some(1), Some(1));
    topup(&conn, 1, "2025-01-01", "1000");
    topup(&conn, 2, "2024-11-01", "5000");

    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    let res = AnalyticsEngine::new(&store, &clock, &cache)
        .get_analytics(ClientScope::All, 30)
        .unwrap();
    assert!(res.success);
    assert!(!res.cached);

    let d = res.data;
    assert_eq!(d.from.to_string(), "2024-12-16");
    assert_eq!(d.to.to_string(), "2025-01-15");
    assert_eq!(d.total_spend, dec("400"));
    assert_eq!(d.total_clicks, 150);
    assert_eq!(d.total_impressions, 3000);
    assert_eq!(d.total_conversions, 5);
    assert_eq!(d.report_count, 2);
    assert_eq!(d.avg_cpc.round_dp(4), dec("2.6667"));
    assert_eq!(d.avg_ctr, dec("5"));
    assert_eq!(d.cpa, Some(dec("80")));
    assert_eq!(d.total_budget, dec("1000"));
    assert_eq!(d.budget_utilization, dec("40"));
}

#[test]
fn spend_by_client_drops_idle_clients_and_sorts_by_spend() {
    let conn = setup();
    report(&conn, 1, "2025-01-10", "100", Some(10), Some(100), Some(1));
    report(&conn, 2, "2025-01-10", "250", Some(10), Some(1000), Some(4));

    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    let d = AnalyticsEngine::new(&store, &clock, &cache)
        .get_analytics(ClientScope::All, 30)
        .unwrap()
        .data;

    let ids: Vec<i64> = d.spend_by_client.iter().map(|c| c.client_id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(d.top_performers.best_ctr.client_id, 1);
    assert_eq!(d.top_performers.best_cpc.client_id, 1);
    assert_eq!(d.top_performers.most_conversions.client_id, 2);
}

#[test]
fn empty_window_yields_zero_ratios_and_placeholder_performers() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    let d = AnalyticsEngine::new(&store, &clock, &cache)
        .get_analytics(ClientScope::Client(3), 7)
        .unwrap()
        .data;

    assert_eq!(d.total_spend, Decimal::ZERO);
    assert_eq!(d.avg_cpc, Decimal::ZERO);
    assert_eq!(d.avg_ctr, Decimal::ZERO);
    assert_eq!(d.cpa, None);
    assert_eq!(d.total_budget, Decimal::ZERO);
    assert_eq!(d.budget_utilization, Decimal::ZERO);
    assert!(d.spend_by_client.is_empty());
    assert!(d.spend_by_month.is_empty());
    assert_eq!(d.top_performers.best_ctr.client_id, 0);
    assert_eq!(d.top_performers.best_ctr.client_name, "-");
}

#[test]
fn months_are_bucketed_across_the_year_boundary_newest_first() {
    let conn = setup();
    report(&conn, 1, "2024-11-20", "10", Some(1), Some(10), None);
    report(&conn, 1, "2024-12-05", "20", Some(2), Some(20), None);
    report(&conn, 2, "2024-12-31", "30", Some(3), Some(30), None);
    report(&conn, 1, "2025-01-01", "40", Some(4), Some(40), None);

    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    let d = AnalyticsEngine::new(&store, &clock, &cache)
        .get_analytics(ClientScope::All, 60)
        .unwrap()
        .data;

    let months: Vec<(&str, &str)> = d
        .spend_by_month
        .iter()
        .map(|m| (m.month.as_str(), m.label.as_str()))
        .collect();
    assert_eq!(
        months,
        vec![
            ("2025-01", "Januari 2025"),
            ("2024-12", "Desember 2024"),
            ("2024-11", "November 2024"),
        ]
    );
    assert_eq!(d.spend_by_month[1].spend, dec("50"));
    assert_eq!(d.spend_by_month[1].clicks, 5);
}

#[test]
fn repeat_request_is_served_from_cache_until_ttl() {
    let conn = setup();
    report(&conn, 1, "2025-01-10", "100", Some(10), Some(100), Some(1));

    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    let engine = AnalyticsEngine::new(&store, &clock, &cache);

    let first = engine.get_analytics(ClientScope::All, 30).unwrap();
    report(&conn, 1, "2025-01-11", "900", Some(10), Some(100), Some(1));
    clock.advance(Duration::seconds(299));
    let second = engine.get_analytics(ClientScope::All, 30).unwrap();
    assert!(second.cached);
    assert_eq!(
        serde_json::to_string(&first.data).unwrap(),
        serde_json::to_string(&second.data).unwrap()
    );

    clock.advance(Duration::seconds(2));
    let third = engine.get_analytics(ClientScope::All, 30).unwrap();
    assert!(!third.cached);
    assert_eq!(third.data.total_spend, dec("1000"));
}

#[test]
fn a_different_key_replaces_the_single_slot() {
    let conn = setup();
    report(&conn, 1, "2025-01-10", "100", Some(10), Some(100), None);

    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    let engine = AnalyticsEngine::new(&store, &clock, &cache);

    engine.get_analytics(ClientScope::All, 30).unwrap();
    let other = engine.get_analytics(ClientScope::All, 7).unwrap();
    assert!(!other.cached);
    let per_client = engine.get_analytics(ClientScope::Client(1), 7).unwrap();
    assert!(!per_client.cached);
    assert_eq!(
        cache.cached_key(),
        Some(AnalyticsKey {
            scope: ClientScope::Client(1),
            days: 7
        })
    );
    assert!(!engine.get_analytics(ClientScope::All, 30).unwrap().cached);
}

struct BrokenStore;

fn broken<T>() -> StoreResult<T> {
    Err(StoreError::Corrupt {
        table: "ad_reports",
        detail: "disk unavailable".to_string(),
    })
}

impl Store for BrokenStore {
    fn find_clients(&self, _scope: ClientScope) -> StoreResult<Vec<Client>> {
        broken()
    }

    fn find_client_by_token(&self, _token: &str) -> StoreResult<Option<Client>> {
        broken()
    }

    fn find_budget_entries(&self, _filter: &BudgetFilter) -> StoreResult<Vec<BudgetEntry>> {
        broken()
    }

    fn find_report_entries(&self, _filter: &ReportFilter) -> StoreResult<Vec<AdReportEntry>> {
        broken()
    }

    fn count_clients(&self) -> StoreResult<u64> {
        broken()
    }

    fn recent_budget_entries(&self, _limit: usize) -> StoreResult<Vec<RecentActivity>> {
        broken()
    }
}

#[test]
fn storage_failure_reports_context_and_keeps_the_cached_slot() {
    let conn = setup();
    report(&conn, 1, "2025-01-10", "100", Some(10), Some(100), None);
    let store = SqliteStore::new(&conn);
    let clock = clock();
    let cache = AnalyticsCache::default();
    AnalyticsEngine::new(&store, &clock, &cache)
        .get_analytics(ClientScope::All, 30)
        .unwrap();

    let err = AnalyticsEngine::new(&BrokenStore, &clock, &cache)
        .get_analytics(ClientScope::Client(2), 14)
        .unwrap_err();
    let AnalyticsError::AggregationFailed { scope, days, .. } = &err;
    assert_eq!(*scope, ClientScope::Client(2));
    assert_eq!(*days, 14);
    assert!(err.to_string().contains("disk unavailable"));

    assert_eq!(
        cache.cached_key(),
        Some(AnalyticsKey {
            scope: ClientScope::All,
            days: 30
        })
    );
    let again = AnalyticsEngine::new(&store, &clock, &cache)
        .get_analytics(ClientScope::All, 30)
        .unwrap();
    assert!(again.cached);
}
