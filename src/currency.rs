// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Display-currency formatting and conversion. Amounts are recorded in the
//! base currency (IDR); the alternate currency (USD) is display-only.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RATE_CACHE_TTL_SECS;
use crate::errors::{CurrencyError, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "IDR")]
    Idr,
    #[serde(rename = "USD")]
    Usd,
}

pub const BASE_CURRENCY: Currency = Currency::Idr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyConfig {
    pub code: Currency,
    pub symbol: &'static str,
    pub locale: &'static str,
    pub name: &'static str,
    pub fraction_digits: u32,
    pub group_separator: char,
    pub decimal_separator: char,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Idr, Currency::Usd];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Idr => "IDR",
            Currency::Usd => "USD",
        }
    }

    pub fn config(&self) -> CurrencyConfig {
        match self {
            Currency::Idr => CurrencyConfig {
                code: Currency::Idr,
                symbol: "Rp",
                locale: "id-ID",
                name: "Indonesian Rupiah",
                fraction_digits: 0,
                group_separator: '.',
                decimal_separator: ',',
            },
            Currency::Usd => CurrencyConfig {
                code: Currency::Usd,
                symbol: "$",
                locale: "en-US",
                name: "US Dollar",
                fraction_digits: 2,
                group_separator: ',',
                decimal_separator: '.',
            },
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDR" => Ok(Currency::Idr),
            "USD" => Ok(Currency::Usd),
            _ => Err(CurrencyError::UnsupportedCurrency(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub fn supported_currencies() -> Vec<CurrencyConfig> {
    Currency::ALL.iter().map(|c| c.config()).collect()
}

pub fn is_valid_currency(code: &str) -> bool {
    code.parse::<Currency>().is_ok()
}

/// Renders `amount` as e.g. `Rp1.000.000` or `-$1,234.57`.
pub fn format_currency(amount: Decimal, code: &str) -> Result<String, CurrencyError> {
    let cfg = code.parse::<Currency>()?.config();
    let digits = grouped_digits(amount.abs(), &cfg);
    let sign = if is_negative_display(amount, &cfg) {
        "-"
    } else {
        ""
    };
    Ok(format!("{}{}{}", sign, cfg.symbol, digits))
}

/// Symbol glued to the locale-formatted number, sign included in the number:
/// `Rp-1.000`.
pub fn format_currency_compact(amount: Decimal, code: &str) -> Result<String, CurrencyError> {
    let cfg = code.parse::<Currency>()?.config();
    let digits = grouped_digits(amount.abs(), &cfg);
    let sign = if is_negative_display(amount, &cfg) {
        "-"
    } else {
        ""
    };
    Ok(format!("{}{}{}", cfg.symbol, sign, digits))
}

fn round_for(amount: Decimal, cfg: &CurrencyConfig) -> Decimal {
    amount.round_dp_with_strategy(cfg.fraction_digits, RoundingStrategy::MidpointAwayFromZero)
}

fn is_negative_display(amount: Decimal, cfg: &CurrencyConfig) -> bool {
    let rounded = round_for(amount, cfg);
    rounded.is_sign_negative() && !rounded.is_zero()
}

fn grouped_digits(abs_amount: Decimal, cfg: &CurrencyConfig) -> String {
    let rounded = round_for(abs_amount, cfg);
    let plain = format!("{:.*}", cfg.fraction_digits as usize, rounded);
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(cfg.group_separator);
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push(cfg.decimal_separator);
        grouped.push_str(frac);
    }
    grouped
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
    pub updated_at: DateTime<Utc>,
}

static FALLBACK_RATES: Lazy<HashMap<(Currency, Currency), Decimal>> = Lazy::new(|| {
    HashMap::from([
        ((Currency::Idr, Currency::Usd), Decimal::new(64, 6)),
        ((Currency::Usd, Currency::Idr), Decimal::new(15625, 0)),
    ])
});

pub fn fallback_rate(from: Currency, to: Currency) -> Option<Decimal> {
    FALLBACK_RATES.get(&(from, to)).copied()
}

/// Rates keyed by ordered pair; an entry counts only while younger than the TTL.
#[derive(Debug)]
pub struct RateCache {
    ttl: Duration,
    entries: Mutex<HashMap<(Currency, Currency), ExchangeRate>>,
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(Duration::seconds(RATE_CACHE_TTL_SECS))
    }
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, from: Currency, to: Currency, now: DateTime<Utc>) -> Option<Decimal> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(from, to))
            .filter(|r| now - r.updated_at < self.ttl)
            .map(|r| r.rate)
    }

    pub fn insert(&self, rate: ExchangeRate) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert((rate.from, rate.to), rate);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn snapshot(&self) -> Vec<ExchangeRate> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<ExchangeRate> = entries.values().copied().collect();
        out.sort_by_key(|r| (r.from, r.to));
        out
    }
}

/// Live source of exchange rates.
pub trait RateProvider: Send + Sync {
    fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, FetchError>;
}

/// exchangerate-api.com v6 `latest` endpoint.
pub struct ExchangeRateApi {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
}

impl ExchangeRateApi {
    pub fn new(client: reqwest::blocking::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://v6.exchangerate-api.com/v6".to_string(),
        }
    }
}

impl RateProvider for ExchangeRateApi {
    fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, FetchError> {
        let key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;
        let url = format!("{}/{}/latest/{}", self.base_url, key, from);
        let resp = self.client.get(url).send()?.error_for_status()?;
        let body: LatestResponse = resp.json()?;
        if body.result != "success" {
            return Err(FetchError::Api(
                body.error_type.unwrap_or_else(|| body.result.clone()),
            ));
        }
        body.conversion_rates
            .get(to.code())
            .copied()
            .filter(|r| *r > 0.0)
            .and_then(Decimal::from_f64)
            .ok_or_else(|| FetchError::MissingRate(to.code().to_string()))
    }
}

pub struct CurrencyService {
    provider: Box<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    cache: RateCache,
    fallbacks: HashMap<(Currency, Currency), Decimal>,
}

impl CurrencyService {
    pub fn new(provider: Box<dyn RateProvider>) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: Box<dyn RateProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            cache: RateCache::default(),
            fallbacks: FALLBACK_RATES.clone(),
        }
    }

    /// Replaces the built-in fallback table. Pairs missing from `rates`
    /// fail with `RateUnavailable` when the provider errors.
    pub fn with_fallback_rates(mut self, rates: HashMap<(Currency, Currency), Decimal>) -> Self {
        self.fallbacks = rates;
        self
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub fn get_exchange_rate(&self, from: Currency, to: Currency) -> Result<Decimal, CurrencyError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let now = self.clock.now();
        if let Some(rate) = self.cache.get(from, to, now) {
            debug!(%from, %to, %rate, "exchange rate cache hit");
            return Ok(rate);
        }

        match self.provider.fetch_rate(from, to) {
            Ok(rate) => {
                info!(%from, %to, %rate, "fetched exchange rate");
                self.cache.insert(ExchangeRate {
                    from,
                    to,
                    rate,
                    updated_at: now,
                });
                Ok(rate)
            }
            Err(err) => match self.fallbacks.get(&(from, to)).copied() {
                Some(rate) => {
                    warn!(%from, %to, %rate, error = %err, "using fallback exchange rate");
                    Ok(rate)
                }
                None => Err(CurrencyError::RateUnavailable {
                    from: from.code().to_string(),
                    to: to.code().to_string(),
                    reason: err.to_string(),
                }),
            },
        }
    }

    pub fn convert_currency(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Decimal, CurrencyError> {
        if from == to {
            return Ok(amount);
        }
        Ok(amount * self.get_exchange_rate(from, to)?)
    }

    /// Warms every ordered pair of distinct currencies. Returns how many
    /// pairs resolved.
    pub fn preload_exchange_rates(&self) -> usize {
        let mut warmed = 0;
        for from in Currency::ALL {
            for to in Currency::ALL {
                if from == to {
                    continue;
                }
                match self.get_exchange_rate(from, to) {
                    Ok(_) => warmed += 1,
                    Err(err) => error!(%from, %to, error = %err, "failed to preload exchange rate"),
                }
            }
        }
        warmed
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
