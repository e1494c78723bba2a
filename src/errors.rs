// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::models::ClientScope;

/// Failures raised by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Exchange rate {from}->{to} unavailable: {reason}")]
    RateUnavailable {
        from: String,
        to: String,
        reason: String,
    },
}

/// Reasons a live rate lookup can fail before the static fallback kicks in.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("EXCHANGE_RATE_API_KEY is not set")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Exchange rate API error: {0}")]
    Api(String),
    #[error("Exchange rate not found for {0}")]
    MissingRate(String),
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Aggregation failed for client={scope} days={days}: {source}")]
    AggregationFailed {
        scope: ClientScope,
        days: u32,
        #[source]
        source: StoreError,
    },
}

/// Errors surfaced by the read models and the staff CRUD helpers.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Client not found: {0}")]
    ClientNotFound(String),
    #[error("Client {0} still owns budget entries or ad reports")]
    ClientInUse(i64),
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Store(StoreError::Sqlite(err))
    }
}
