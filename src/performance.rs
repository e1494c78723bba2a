// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Spend and engagement totals over ad reports, and the efficiency ratios
//! derived from them.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::StoreResult;
use crate::models::{AdReportEntry, ClientScope, DateRange, ReportFilter};
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportAggregate {
    pub spend: Decimal,
    pub clicks: u64,
    pub impressions: u64,
    pub conversions: u64,
    pub report_count: u64,
}

impl ReportAggregate {
    pub fn from_rows(rows: &[AdReportEntry]) -> Self {
        let mut agg = Self::default();
        for row in rows {
            agg.add(row);
        }
        agg
    }

    pub fn add(&mut self, row: &AdReportEntry) {
        self.spend += row.spend;
        self.clicks += row.clicks.unwrap_or(0);
        self.impressions += row.impressions.unwrap_or(0);
        self.conversions += row.conversions.unwrap_or(0);
        self.report_count += 1;
    }

    pub fn avg_cpc(&self) -> Decimal {
        cpc(self.spend, self.clicks).unwrap_or(Decimal::ZERO)
    }

    pub fn avg_ctr(&self) -> Decimal {
        ctr(self.clicks, self.impressions).unwrap_or(Decimal::ZERO)
    }

    /// Cost per conversion; `None` renders as "—", never as zero.
    pub fn cpa(&self) -> Option<Decimal> {
        if self.conversions == 0 {
            None
        } else {
            self.spend.checked_div(Decimal::from(self.conversions))
        }
    }

    pub fn conversion_rate(&self) -> Decimal {
        percent(self.conversions, self.clicks).unwrap_or(Decimal::ZERO)
    }
}

pub fn cpc(spend: Decimal, clicks: u64) -> Option<Decimal> {
    if clicks == 0 {
        return None;
    }
    spend.checked_div(Decimal::from(clicks))
}

pub fn ctr(clicks: u64, impressions: u64) -> Option<Decimal> {
    percent(clicks, impressions)
}

/// `None` when `whole` is zero or the result does not fit a `Decimal`.
fn percent(part: u64, whole: u64) -> Option<Decimal> {
    if whole == 0 {
        return None;
    }
    Decimal::from(part)
        .checked_div(Decimal::from(whole))?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Cost per click where zero clicks has no ratio at all. The derived order
/// puts `Undefined` after every finite cost so it never wins a "lowest" race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CostRatio {
    Finite(Decimal),
    Undefined,
}

impl CostRatio {
    pub fn per_click(spend: Decimal, clicks: u64) -> Self {
        cpc(spend, clicks).map_or(CostRatio::Undefined, CostRatio::Finite)
    }
}

/// One client's totals within an aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientPerformance {
    pub client_id: i64,
    pub client_name: String,
    pub spend: Decimal,
    pub clicks: u64,
    pub impressions: u64,
    pub conversions: u64,
}

impl ClientPerformance {
    pub fn placeholder() -> Self {
        Self {
            client_id: 0,
            client_name: "-".to_string(),
            spend: Decimal::ZERO,
            clicks: 0,
            impressions: 0,
            conversions: 0,
        }
    }

    /// CTR for ranking: no impressions scores 0.
    pub fn ctr_score(&self) -> Decimal {
        ctr(self.clicks, self.impressions).unwrap_or(Decimal::ZERO)
    }

    pub fn cost_per_click(&self) -> CostRatio {
        CostRatio::per_click(self.spend, self.clicks)
    }
}

pub fn aggregate<S: Store + ?Sized>(
    store: &S,
    scope: ClientScope,
    range: DateRange,
) -> StoreResult<ReportAggregate> {
    store.sum_report_fields(&ReportFilter::new(scope, range))
}

/// Per-client totals for every client in scope, in client order, including
/// clients without any reports.
pub fn per_client_breakdown<S: Store + ?Sized>(
    store: &S,
    scope: ClientScope,
    range: DateRange,
) -> StoreResult<Vec<ClientPerformance>> {
    let clients = store.find_clients(scope)?;
    let rows = store.find_report_entries(&ReportFilter::new(scope, range))?;

    let mut by_client: HashMap<i64, ReportAggregate> = HashMap::new();
    for row in &rows {
        by_client.entry(row.client_id).or_default().add(row);
    }

    Ok(clients
        .into_iter()
        .map(|c| {
            let agg = by_client.get(&c.id).copied().unwrap_or_default();
            ClientPerformance {
                client_id: c.id,
                client_name: c.name,
                spend: agg.spend,
                clicks: agg.clicks,
                impressions: agg.impressions,
                conversions: agg.conversions,
            }
        })
        .collect())
}

/// Drops zero-spend clients and orders the rest by spend, highest first.
/// Equal spends keep their incoming order.
pub fn ranked_by_spend(mut breakdown: Vec<ClientPerformance>) -> Vec<ClientPerformance> {
    breakdown.retain(|c| c.spend > Decimal::ZERO);
    breakdown.sort_by(|a, b| b.spend.cmp(&a.spend));
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn perf(id: i64, spend: &str, clicks: u64) -> ClientPerformance {
        ClientPerformance {
            client_id: id,
            client_name: format!("c{}", id),
            spend: dec(spend),
            clicks,
            impressions: 0,
            conversions: 0,
        }
    }

    #[test]
    fn ratios_are_zero_or_none_without_denominators() {
        let agg = ReportAggregate {
            spend: dec("100"),
            ..Default::default()
        };
        assert_eq!(agg.avg_cpc(), Decimal::ZERO);
        assert_eq!(agg.avg_ctr(), Decimal::ZERO);
        assert_eq!(agg.cpa(), None);
        assert_eq!(agg.conversion_rate(), Decimal::ZERO);
    }

    #[test]
    fn ratios_follow_their_formulas() {
        let agg = ReportAggregate {
            spend: dec("250"),
            clicks: 50,
            impressions: 1000,
            conversions: 5,
            report_count: 2,
        };
        assert_eq!(agg.avg_cpc(), dec("5"));
        assert_eq!(agg.avg_ctr(), dec("5"));
        assert_eq!(agg.cpa(), Some(dec("50")));
        assert_eq!(agg.conversion_rate(), dec("10"));
    }

    #[test]
    fn ratios_at_counter_extremes_stay_finite() {
        assert_eq!(cpc(Decimal::MAX, 1), Some(Decimal::MAX));
        assert_eq!(percent(u64::MAX, 1), Some(Decimal::from(u64::MAX) * Decimal::ONE_HUNDRED));
        let agg = ReportAggregate {
            spend: Decimal::MAX,
            clicks: u64::MAX,
            impressions: 1,
            conversions: 1,
            report_count: 1,
        };
        assert_eq!(agg.cpa(), Some(Decimal::MAX));
        assert!(agg.avg_ctr() > Decimal::ZERO);
    }

    #[test]
    fn undefined_cost_ratio_sorts_after_any_finite_cost() {
        assert!(CostRatio::Finite(dec("1000000")) < CostRatio::Undefined);
        assert!(CostRatio::Finite(dec("1")) < CostRatio::Finite(dec("2")));
        assert_eq!(CostRatio::per_click(dec("10"), 0), CostRatio::Undefined);
    }

    #[test]
    fn ranking_drops_zero_spend_and_keeps_ties_stable() {
        let ranked = ranked_by_spend(vec![
            perf(1, "10", 0),
            perf(2, "0", 0),
            perf(3, "30", 0),
            perf(4, "10", 0),
        ]);
        let ids: Vec<i64> = ranked.iter().map(|c| c.client_id).collect();
        assert_eq!(ids, vec![3, 1, 4]);
    }
}
