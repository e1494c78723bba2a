// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub is_active: bool,
    pub access_token: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    Topup,
    Bonus,
    Adj,
}

impl BudgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetKind::Topup => "topup",
            BudgetKind::Bonus => "bonus",
            BudgetKind::Adj => "adj",
        }
    }
}

impl FromStr for BudgetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topup" => Ok(BudgetKind::Topup),
            "bonus" => Ok(BudgetKind::Bonus),
            "adj" => Ok(BudgetKind::Adj),
            other => Err(format!(
                "Invalid budget kind '{}', expected topup|bonus|adj",
                other
            )),
        }
    }
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub id: i64,
    pub client_id: i64,
    pub date: NaiveDate,
    pub kind: BudgetKind,
    pub amount: Decimal,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdReportEntry {
    pub id: i64,
    pub client_id: i64,
    pub date: NaiveDate,
    pub account_id: String,
    pub spend: Decimal,
    // None = not tracked
    pub clicks: Option<u64>,
    pub impressions: Option<u64>,
    pub conversions: Option<u64>,
}

/// Which clients an aggregate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientScope {
    #[default]
    All,
    Client(i64),
}

impl ClientScope {
    pub fn client_id(&self) -> Option<i64> {
        match self {
            ClientScope::All => None,
            ClientScope::Client(id) => Some(*id),
        }
    }
}

impl FromStr for ClientScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(ClientScope::All);
        }
        s.parse::<i64>()
            .map(ClientScope::Client)
            .map_err(|_| format!("Invalid client filter '{}', expected 'all' or an id", s))
    }
}

impl fmt::Display for ClientScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientScope::All => f.write_str("all"),
            ClientScope::Client(id) => write!(f, "{}", id),
        }
    }
}

impl Serialize for ClientScope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive calendar-date bounds; a missing side is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|f| date >= f) && self.to.is_none_or(|t| date <= t)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub scope: ClientScope,
    pub range: DateRange,
    pub kind: Option<BudgetKind>,
}

impl BudgetFilter {
    pub fn topups(scope: ClientScope, range: DateRange) -> Self {
        Self {
            scope,
            range,
            kind: Some(BudgetKind::Topup),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub scope: ClientScope,
    pub range: DateRange,
}

impl ReportFilter {
    pub fn new(scope: ClientScope, range: DateRange) -> Self {
        Self { scope, range }
    }
}

/// A budget entry joined with its client's display name.
#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub id: i64,
    pub client: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: BudgetKind,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_scope_parses_all_and_ids() {
        assert_eq!("all".parse::<ClientScope>().unwrap(), ClientScope::All);
        assert_eq!(" ALL ".parse::<ClientScope>().unwrap(), ClientScope::All);
        assert_eq!("42".parse::<ClientScope>().unwrap(), ClientScope::Client(42));
        assert!("abc".parse::<ClientScope>().is_err());
        assert_eq!(ClientScope::Client(7).to_string(), "7");
    }

    #[test]
    fn date_range_bounds_are_inclusive_and_open_ended() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let r = DateRange::between(d(5), d(10));
        assert!(r.contains(d(5)));
        assert!(r.contains(d(10)));
        assert!(!r.contains(d(11)));

        let open = DateRange {
            from: Some(d(5)),
            to: None,
        };
        assert!(open.contains(d(31)));
        assert!(!open.contains(d(4)));
        assert!(DateRange::all_time().contains(d(1)));
    }

    #[test]
    fn budget_kind_round_trips_through_text() {
        for kind in [BudgetKind::Topup, BudgetKind::Bonus, BudgetKind::Adj] {
            assert_eq!(kind.as_str().parse::<BudgetKind>().unwrap(), kind);
        }
        assert!("refund".parse::<BudgetKind>().is_err());
    }
}
