// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use rust_decimal::Decimal;

/// Vendor fee deducted once from the gross topup total (5%).
pub const FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

pub const RATE_CACHE_TTL_SECS: i64 = 300;
pub const ANALYTICS_CACHE_TTL_SECS: i64 = 300;

pub const DEFAULT_ANALYTICS_DAYS: u32 = 30;
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

pub const API_KEY_ENV: &str = "EXCHANGE_RATE_API_KEY";
pub const DB_PATH_ENV: &str = "ADLEDGER_DB";

/// Runtime settings supplied through the environment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub exchange_rate_api_key: Option<String>,
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            exchange_rate_api_key: non_empty(API_KEY_ENV),
            db_path: non_empty(DB_PATH_ENV).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_rate_is_five_percent() {
        assert_eq!(FEE_RATE.to_string(), "0.05");
    }
}
