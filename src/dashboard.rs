// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::RECENT_ACTIVITY_LIMIT;
use crate::errors::LedgerError;
use crate::ledger::{self, BudgetAggregate};
use crate::models::{
    AdReportEntry, BudgetEntry, BudgetFilter, ClientScope, DateRange, RecentActivity, ReportFilter,
};
use crate::performance;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    pub total_topup: Decimal,
    pub total_spend: Decimal,
    pub sisa_saldo: Decimal,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub total_conversions: u64,
}

/// All-time balance and engagement for one client.
pub fn get_budget_summary<S: Store + ?Sized>(
    store: &S,
    client_id: i64,
) -> Result<BudgetSummary, LedgerError> {
    let scope = ClientScope::Client(client_id);
    if store.find_clients(scope)?.is_empty() {
        return Err(LedgerError::ClientNotFound(client_id.to_string()));
    }
    let topup = ledger::total_topup(store, scope, DateRange::all_time())?;
    let reports = performance::aggregate(store, scope, DateRange::all_time())?;
    let balance = BudgetAggregate::new(topup, reports.spend);

    Ok(BudgetSummary {
        total_topup: balance.total_topup,
        total_spend: balance.total_spend,
        sisa_saldo: balance.remaining_balance,
        total_clicks: reports.clicks,
        total_impressions: reports.impressions,
        total_conversions: reports.conversions,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_clients: u64,
    pub total_budget: Decimal,
    pub total_spend: Decimal,
    pub total_reports: u64,
    pub recent_activity: Vec<RecentActivity>,
}

pub fn get_dashboard_stats<S: Store + ?Sized>(store: &S) -> Result<DashboardStats, LedgerError> {
    let everything = ReportFilter::default();
    Ok(DashboardStats {
        total_clients: store.count_clients()?,
        total_budget: ledger::total_topup(store, ClientScope::All, DateRange::all_time())?,
        total_spend: store.sum_report_fields(&everything)?.spend,
        total_reports: store.count_reports(&everything)?,
        recent_activity: store.recent_budget_entries(RECENT_ACTIVITY_LIMIT)?,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicClient {
    pub name: String,
    pub company: Option<String>,
}

/// What a client sees through their access-token link.
#[derive(Debug, Clone, Serialize)]
pub struct PublicView {
    pub client: PublicClient,
    pub range: DateRange,
    pub reports: Vec<AdReportEntry>,
    pub budgets: Vec<BudgetEntry>,
    pub total_spend_all_time: Decimal,
    pub balance: BudgetAggregate,
}

/// Reports follow `range`; budgets and the balance are always all-time so the
/// remaining balance does not shift with the filter.
pub fn get_public_view<S: Store + ?Sized>(
    store: &S,
    access_token: &str,
    range: DateRange,
) -> Result<PublicView, LedgerError> {
    let client = store
        .find_client_by_token(access_token)?
        .ok_or_else(|| LedgerError::ClientNotFound("invalid access token".to_string()))?;
    let scope = ClientScope::Client(client.id);

    let reports = store.find_report_entries(&ReportFilter::new(scope, range))?;
    let budgets = store.find_budget_entries(&BudgetFilter {
        scope,
        ..Default::default()
    })?;
    let total_spend_all_time = performance::aggregate(store, scope, DateRange::all_time())?.spend;
    let topup = ledger::total_topup(store, scope, DateRange::all_time())?;

    Ok(PublicView {
        client: PublicClient {
            name: client.name,
            company: client.company,
        },
        range,
        reports,
        budgets,
        total_spend_all_time,
        balance: BudgetAggregate::new(topup, total_spend_all_time),
    })
}
