// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adledger::clock::FixedClock;
use adledger::currency::{Currency, CurrencyService, ExchangeRateApi, RateProvider};
use adledger::errors::{CurrencyError, FetchError};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

struct StubProvider {
    calls: Arc<AtomicUsize>,
    rate: Option<Decimal>,
}

impl RateProvider for StubProvider {
    fn fetch_rate(&self, _from: Currency, _to: Currency) -> Result<Decimal, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rate
            .ok_or_else(|| FetchError::Api("service down".to_string()))
    }
}

fn service(rate: Option<Decimal>) -> (CurrencyService, Arc<AtomicUsize>, Arc<FixedClock>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
    ));
    let provider = StubProvider {
        calls: calls.clone(),
        rate,
    };
    let svc = CurrencyService::with_clock(Box::new(provider), clock.clone());
    (svc, calls, clock)
}

#[test]
fn same_currency_is_identity_without_fetching() {
    let (svc, calls, _) = service(Some(Decimal::new(7, 5)));
    assert_eq!(
        svc.get_exchange_rate(Currency::Usd, Currency::Usd).unwrap(),
        Decimal::ONE
    );
    let amount = Decimal::new(12345, 2);
    assert_eq!(
        svc.convert_currency(amount, Currency::Idr, Currency::Idr)
            .unwrap(),
        amount
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn fetched_rate_is_served_from_cache_until_it_expires() {
    let (svc, calls, clock) = service(Some(Decimal::new(7, 5)));

    let first = svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    clock.advance(Duration::seconds(299));
    let second = svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    assert_eq!(first, Decimal::new(7, 5));
    assert_eq!(second, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::seconds(2));
    svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn cache_is_keyed_by_ordered_pair() {
    let (svc, calls, _) = service(Some(Decimal::new(7, 5)));
    svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    svc.get_exchange_rate(Currency::Usd, Currency::Idr).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(svc.cache().snapshot().len(), 2);
}

#[test]
fn provider_failure_uses_fallback_and_does_not_cache_it() {
    let (svc, calls, _) = service(None);

    let rate = svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    assert_eq!(rate, Decimal::new(64, 6));
    assert_eq!(
        svc.get_exchange_rate(Currency::Usd, Currency::Idr).unwrap(),
        Decimal::new(15625, 0)
    );
    assert!(svc.cache().snapshot().is_empty());

    // Fallbacks are retried against the provider on the next call.
    svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn missing_fallback_surfaces_rate_unavailable() {
    let (svc, _, _) = service(None);
    let svc = svc.with_fallback_rates(HashMap::new());
    let err = svc
        .convert_currency(Decimal::ONE, Currency::Usd, Currency::Idr)
        .unwrap_err();
    match err {
        CurrencyError::RateUnavailable { from, to, reason } => {
            assert_eq!(from, "USD");
            assert_eq!(to, "IDR");
            assert!(reason.contains("service down"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn conversion_multiplies_by_the_rate() {
    let (svc, _, _) = service(None);
    let usd = svc
        .convert_currency(Decimal::new(1_000_000, 0), Currency::Idr, Currency::Usd)
        .unwrap();
    assert_eq!(usd, Decimal::new(64, 0));
}

#[test]
fn fallback_round_trip_returns_the_original_amount() {
    let (svc, _, _) = service(None);
    let amount = Decimal::new(1_234_567, 0);
    let usd = svc
        .convert_currency(amount, Currency::Idr, Currency::Usd)
        .unwrap();
    let back = svc
        .convert_currency(usd, Currency::Usd, Currency::Idr)
        .unwrap();
    assert!((back - amount).abs() <= Decimal::new(1, 2));
}

#[test]
fn preload_warms_every_pair_and_keeps_going_on_failure() {
    let (svc, calls, _) = service(Some(Decimal::new(2, 0)));
    assert_eq!(svc.preload_exchange_rates(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(svc.cache().snapshot().len(), 2);

    let (broken, calls, _) = service(None);
    let broken = broken.with_fallback_rates(HashMap::new());
    assert_eq!(broken.preload_exchange_rates(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn clearing_the_cache_forces_a_refetch() {
    let (svc, calls, _) = service(Some(Decimal::new(7, 5)));
    svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    svc.clear_cache();
    svc.get_exchange_rate(Currency::Idr, Currency::Usd).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn live_provider_requires_an_api_key() {
    let api = ExchangeRateApi::new(reqwest::blocking::Client::new(), None);
    let err = api.fetch_rate(Currency::Idr, Currency::Usd).unwrap_err();
    assert!(matches!(err, FetchError::MissingApiKey));
}

#[test]
fn unsupported_codes_fail_to_parse() {
    let err = "EUR".parse::<Currency>().unwrap_err();
    assert!(matches!(err, CurrencyError::UnsupportedCurrency(ref c) if c == "EUR"));
}
