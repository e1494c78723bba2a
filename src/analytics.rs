// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cross-client analytics for a lookback window, with a single-slot cache.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::ANALYTICS_CACHE_TTL_SECS;
use crate::errors::{AnalyticsError, StoreResult};
use crate::ledger;
use crate::models::{AdReportEntry, ClientScope, DateRange, ReportFilter};
use crate::performance::{self, ClientPerformance, ReportAggregate};
use crate::store::Store;

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Calendar month; orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn label(&self) -> String {
        let name = MONTHS_ID
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        format!("{} {}", name, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub label: String,
    pub spend: Decimal,
    pub clicks: u64,
    pub impressions: u64,
    pub conversions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPerformers {
    pub best_ctr: ClientPerformance,
    pub best_cpc: ClientPerformance,
    pub most_conversions: ClientPerformance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsPayload {
    pub client: ClientScope,
    pub days: u32,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_spend: Decimal,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub total_conversions: u64,
    pub report_count: u64,
    pub avg_cpc: Decimal,
    pub avg_ctr: Decimal,
    pub cpa: Option<Decimal>,
    pub conversion_rate: Decimal,
    pub total_budget: Decimal,
    pub budget_utilization: Decimal,
    pub spend_by_client: Vec<ClientPerformance>,
    pub spend_by_month: Vec<MonthlyTrend>,
    pub top_performers: TopPerformers,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub data: AnalyticsPayload,
    pub cached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalyticsKey {
    pub scope: ClientScope,
    pub days: u32,
}

#[derive(Debug)]
struct Snapshot {
    key: AnalyticsKey,
    payload: AnalyticsPayload,
    created_at: DateTime<Utc>,
}

/// Holds at most one computed payload. Staleness is checked on read only.
#[derive(Debug)]
pub struct AnalyticsCache {
    ttl: Duration,
    slot: Mutex<Option<Snapshot>>,
}

impl Default for AnalyticsCache {
    fn default() -> Self {
        Self::new(Duration::seconds(ANALYTICS_CACHE_TTL_SECS))
    }
}

impl AnalyticsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn lookup(&self, key: AnalyticsKey, now: DateTime<Utc>) -> Option<AnalyticsPayload> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|s| s.key == key && now - s.created_at < self.ttl)
            .map(|s| s.payload.clone())
    }

    pub fn store(&self, key: AnalyticsKey, payload: AnalyticsPayload, now: DateTime<Utc>) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Snapshot {
            key,
            payload,
            created_at: now,
        });
    }

    pub fn cached_key(&self) -> Option<AnalyticsKey> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|s| s.key)
    }
}

/// Inclusive `[today - days, today]` on calendar dates.
pub fn lookback_range(now: DateTime<Utc>, days: u32) -> DateRange {
    let today = now.date_naive();
    let from = today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    DateRange::between(from, today)
}

/// Sums rows per calendar month, most recent month first.
pub fn month_trend(rows: &[AdReportEntry]) -> Vec<MonthlyTrend> {
    let mut buckets: BTreeMap<YearMonth, ReportAggregate> = BTreeMap::new();
    for row in rows {
        buckets.entry(YearMonth::of(row.date)).or_default().add(row);
    }
    buckets
        .into_iter()
        .rev()
        .map(|(ym, agg)| MonthlyTrend {
            month: ym.key(),
            label: ym.label(),
            spend: agg.spend,
            clicks: agg.clicks,
            impressions: agg.impressions,
            conversions: agg.conversions,
        })
        .collect()
}

/// Picks winners from a ranked breakdown. The first entry seeds every race
/// and only a strictly better candidate replaces the current best.
pub fn top_performers(ranked: &[ClientPerformance]) -> TopPerformers {
    let seed = ranked
        .first()
        .cloned()
        .unwrap_or_else(ClientPerformance::placeholder);

    let mut best_ctr = &seed;
    let mut best_cpc = &seed;
    let mut most_conversions = &seed;
    for current in ranked {
        if current.ctr_score() > best_ctr.ctr_score() {
            best_ctr = current;
        }
        if current.cost_per_click() < best_cpc.cost_per_click() {
            best_cpc = current;
        }
        if current.conversions > most_conversions.conversions {
            most_conversions = current;
        }
    }

    TopPerformers {
        best_ctr: best_ctr.clone(),
        best_cpc: best_cpc.clone(),
        most_conversions: most_conversions.clone(),
    }
}

pub fn budget_utilization(total_spend: Decimal, total_budget: Decimal) -> Decimal {
    if total_budget <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_spend
        .checked_div(total_budget)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

pub struct AnalyticsEngine<'a> {
    store: &'a dyn Store,
    clock: &'a dyn Clock,
    cache: &'a AnalyticsCache,
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(store: &'a dyn Store, clock: &'a dyn Clock, cache: &'a AnalyticsCache) -> Self {
        Self {
            store,
            clock,
            cache,
        }
    }

    pub fn get_analytics(
        &self,
        scope: ClientScope,
        days: u32,
    ) -> Result<AnalyticsResponse, AnalyticsError> {
        let key = AnalyticsKey { scope, days };
        let now = self.clock.now();

        if let Some(data) = self.cache.lookup(key, now) {
            debug!(client = %scope, days, "analytics cache hit");
            return Ok(AnalyticsResponse {
                success: true,
                data,
                cached: true,
            });
        }

        let data = self
            .compute(scope, days, now)
            .map_err(|source| AnalyticsError::AggregationFailed {
                scope,
                days,
                source,
            })?;
        info!(client = %scope, days, reports = data.report_count, "analytics recomputed");
        self.cache.store(key, data.clone(), now);

        Ok(AnalyticsResponse {
            success: true,
            data,
            cached: false,
        })
    }

    fn compute(
        &self,
        scope: ClientScope,
        days: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<AnalyticsPayload> {
        let range = lookback_range(now, days);

        let totals = performance::aggregate(self.store, scope, range)?;
        let total_budget = ledger::total_topup(self.store, scope, range)?;
        let breakdown = performance::per_client_breakdown(self.store, scope, range)?;
        let spend_by_client = performance::ranked_by_spend(breakdown);
        let rows = self
            .store
            .find_report_entries(&ReportFilter::new(scope, range))?;
        let spend_by_month = month_trend(&rows);
        let top_performers = top_performers(&spend_by_client);

        Ok(AnalyticsPayload {
            client: scope,
            days,
            from: range.from.unwrap_or(NaiveDate::MIN),
            to: range.to.unwrap_or(NaiveDate::MAX),
            total_spend: totals.spend,
            total_clicks: totals.clicks,
            total_impressions: totals.impressions,
            total_conversions: totals.conversions,
            report_count: totals.report_count,
            avg_cpc: totals.avg_cpc(),
            avg_ctr: totals.avg_ctr(),
            cpa: totals.cpa(),
            conversion_rate: totals.conversion_rate(),
            total_budget,
            budget_utilization: budget_utilization(totals.spend, total_budget),
            spend_by_client,
            spend_by_month,
            top_performers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(
        id: i64,
        spend: i64,
        clicks: u64,
        impressions: u64,
        conversions: u64,
    ) -> ClientPerformance {
        ClientPerformance {
            client_id: id,
            client_name: format!("client-{}", id),
            spend: Decimal::new(spend, 0),
            clicks,
            impressions,
            conversions,
        }
    }

    #[test]
    fn zero_click_client_never_wins_best_cpc() {
        let ranked = vec![perf(1, 100, 0, 0, 0), perf(2, 50, 10, 100, 0)];
        assert_eq!(top_performers(&ranked).best_cpc.client_id, 2);
    }

    #[test]
    fn zero_impression_client_never_wins_best_ctr() {
        let ranked = vec![perf(1, 100, 5, 0, 0), perf(2, 50, 1, 100, 0)];
        assert_eq!(top_performers(&ranked).best_ctr.client_id, 2);
    }

    #[test]
    fn ties_go_to_the_first_client() {
        let ranked = vec![perf(1, 100, 10, 100, 3), perf(2, 100, 10, 100, 3)];
        let top = top_performers(&ranked);
        assert_eq!(top.best_ctr.client_id, 1);
        assert_eq!(top.best_cpc.client_id, 1);
        assert_eq!(top.most_conversions.client_id, 1);
    }

    #[test]
    fn empty_breakdown_yields_placeholders() {
        let top = top_performers(&[]);
        assert_eq!(top.best_ctr.client_name, "-");
        assert_eq!(top.most_conversions.conversions, 0);
    }

    #[test]
    fn all_zero_click_clients_keep_the_first_as_best_cpc() {
        let ranked = vec![perf(1, 100, 0, 0, 0), perf(2, 50, 0, 0, 0)];
        assert_eq!(top_performers(&ranked).best_cpc.client_id, 1);
    }

    #[test]
    fn utilization_is_zero_without_budget() {
        assert_eq!(
            budget_utilization(Decimal::new(500, 0), Decimal::ZERO),
            Decimal::ZERO
        );
        assert_eq!(
            budget_utilization(Decimal::new(250, 0), Decimal::new(1000, 0)),
            Decimal::new(25, 0)
        );
    }

    #[test]
    fn utilization_out_of_decimal_range_is_zero() {
        assert_eq!(
            budget_utilization(Decimal::MAX, Decimal::new(1, 28)),
            Decimal::ZERO
        );
    }

    #[test]
    fn month_labels_are_indonesian() {
        let ym = YearMonth { year: 2025, month: 8 };
        assert_eq!(ym.key(), "2025-08");
        assert_eq!(ym.label(), "Agustus 2025");
    }
}
