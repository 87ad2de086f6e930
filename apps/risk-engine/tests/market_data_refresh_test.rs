//! Market Data Refresh Integration Tests
//!
//! A refresh cycle: fill leg Greeks from a mock chain through the quote
//! cache, then run the metrics pipeline over the refreshed portfolio.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use risk_engine::config::PricingConfig;
use risk_engine::market_data::{
    ContractKey, GreeksSource, LegGreeksRefresher, MarketDataError, MarketDataProvider,
    OptionMark, QuoteCache, UnderlyingSnapshot,
};
use risk_engine::models::{OptionType, StrategyType};
use risk_engine::pricing::{OptionInputs, OptionKind, price_option, to_decimal};
use risk_engine::{
    DiagnosticKind, Greeks, Leg, MarketConditions, Portfolio, PortfolioMetricsEngine, Strategy,
};

// =============================================================================
// Mock provider
// =============================================================================

#[derive(Default)]
struct MockChain {
    underlyings: HashMap<String, UnderlyingSnapshot>,
    marks: HashMap<(String, ContractKey), OptionMark>,
    underlying_calls: AtomicUsize,
}

impl MockChain {
    fn with_underlying(mut self, ticker: &str, price: Decimal, hv: Option<Decimal>) -> Self {
        self.underlyings.insert(
            ticker.to_string(),
            UnderlyingSnapshot {
                price,
                previous_close: price,
                historical_volatility: hv,
            },
        );
        self
    }

    fn with_mark(mut self, ticker: &str, leg: &Leg, mark: OptionMark) -> Self {
        let key = ContractKey::for_leg(leg).unwrap();
        self.marks.insert((ticker.to_string(), key), mark);
        self
    }
}

#[async_trait]
impl MarketDataProvider for MockChain {
    async fn underlying(
        &self,
        ticker: &str,
        _as_of: NaiveDate,
    ) -> Result<UnderlyingSnapshot, MarketDataError> {
        self.underlying_calls.fetch_add(1, Ordering::SeqCst);
        self.underlyings
            .get(ticker)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound {
                resource: ticker.to_string(),
            })
    }

    async fn option_mark(
        &self,
        ticker: &str,
        _as_of: NaiveDate,
        contract: &ContractKey,
    ) -> Result<Option<OptionMark>, MarketDataError> {
        Ok(self
            .marks
            .get(&(ticker.to_string(), contract.clone()))
            .cloned())
    }
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn kernel_price(volatility: f64) -> f64 {
    price_option(&OptionInputs {
        spot: 100.0,
        strike: 100.0,
        time_to_expiry: 30.0 / 365.0,
        rate: 0.05,
        dividend_yield: 0.0,
        volatility,
        kind: OptionKind::Call,
    })
    .unwrap()
    .price
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn mark_price_is_inverted_to_implied_volatility() {
    let leg = Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(300));
    let mark = OptionMark {
        price: Some(to_decimal(kernel_price(0.30))),
        greeks: None,
        implied_volatility: None,
    };
    let chain = MockChain::default()
        .with_underlying("SPY", dec!(100), Some(dec!(0.18)))
        .with_mark("SPY", &leg, mark);

    let mut strategy = Strategy::builder("SPY", StrategyType::LongCall)
        .leg(leg)
        .build()
        .unwrap();
    let mut cache = QuoteCache::new(&chain);
    let summary = LegGreeksRefresher::new(&PricingConfig::default())
        .refresh_strategy(&mut strategy, &mut cache, as_of())
        .await
        .unwrap();

    assert_eq!(summary.count(GreeksSource::ImpliedFromMark), 1);
    let iv = strategy.legs[0].implied_volatility.unwrap();
    assert!((iv - dec!(0.30)).abs() < dec!(0.0001), "iv {iv}");
    assert!(strategy.legs[0].greeks.unwrap().vega > Decimal::ZERO);
}

#[tokio::test]
async fn refreshed_portfolio_runs_clean() {
    let short_put = Leg::option(OptionType::Put, dec!(95), 30, dec!(-1), dec!(-180));
    let long_put = Leg::option(OptionType::Put, dec!(90), 30, dec!(1), dec!(80));
    let quoted = Greeks::new(dec!(-0.28), dec!(0.04), dec!(-0.06), dec!(0.10));

    let chain = MockChain::default()
        .with_underlying("SPY", dec!(100), Some(dec!(0.22)))
        .with_underlying("KO", dec!(62), None)
        .with_mark(
            "SPY",
            &short_put,
            OptionMark {
                price: Some(dec!(1.60)),
                greeks: Some(quoted),
                implied_volatility: Some(dec!(0.24)),
            },
        );

    let mut portfolio = Portfolio::new(dec!(100000), dec!(50000), dec!(50000))
        .with_strategy(
            Strategy::builder("SPY", StrategyType::BullPutSpread)
                .leg(short_put)
                .leg(long_put)
                .build()
                .unwrap(),
        )
        .with_strategy(
            Strategy::builder("KO", StrategyType::LongStock)
                .leg(Leg::stock(dec!(100), dec!(6000)))
                .build()
                .unwrap(),
        )
        .with_strategy(
            Strategy::builder("SPY", StrategyType::LongCall)
                .leg(Leg::option(OptionType::Call, dec!(105), 45, dec!(2), dec!(300)))
                .build()
                .unwrap(),
        );

    let mut cache = QuoteCache::new(&chain);
    let refresh = LegGreeksRefresher::default()
        .refresh_portfolio(&mut portfolio, &mut cache, as_of())
        .await;

    assert!(refresh.failures.is_empty());
    // One underlying fetch per ticker across the cycle.
    assert_eq!(chain.underlying_calls.load(Ordering::SeqCst), 2);

    let spread = refresh.summaries[0].as_ref().unwrap();
    assert_eq!(
        spread.sources,
        vec![Some(GreeksSource::Provider), Some(GreeksSource::Model)]
    );
    assert_eq!(portfolio.strategies[0].legs[0].greeks, Some(quoted));

    // KO: 100 × 62 - 6000
    assert_eq!(portfolio.strategies[1].current_pnl, dec!(200));

    let report = PortfolioMetricsEngine::default()
        .run(&mut portfolio, &MarketConditions::new(dec!(500), dec!(18)));

    assert!(report.is_clean());
    assert_eq!(report.of_kind(DiagnosticKind::MissingLegGreeks).count(), 0);
    assert_eq!(portfolio.strategies[1].greeks.delta, dec!(100));
    let pnl: Decimal = portfolio.strategies.iter().map(|s| s.current_pnl).sum();
    assert_eq!(portfolio.pnl, pnl);
}

#[tokio::test]
async fn unknown_ticker_is_isolated() {
    let chain = MockChain::default().with_underlying("SPY", dec!(100), None);
    let stale = Greeks::new(dec!(0.5), dec!(0.01), dec!(-0.02), dec!(0.05));

    let mut portfolio = Portfolio::new(dec!(100000), dec!(50000), dec!(50000))
        .with_strategy(
            Strategy::builder("DELISTED", StrategyType::LongCall)
                .leg(
                    Leg::option(OptionType::Call, dec!(10), 30, dec!(1), dec!(50))
                        .with_greeks(stale),
                )
                .current_pnl(dec!(-20))
                .build()
                .unwrap(),
        )
        .with_strategy(
            Strategy::builder("SPY", StrategyType::LongStock)
                .leg(Leg::stock(dec!(10), dec!(1000)))
                .build()
                .unwrap(),
        );

    let mut cache = QuoteCache::new(&chain);
    let refresh = LegGreeksRefresher::default()
        .refresh_portfolio(&mut portfolio, &mut cache, as_of())
        .await;

    assert_eq!(refresh.failures.len(), 1);
    let (index, err) = &refresh.failures[0];
    assert_eq!(*index, 0);
    assert!(matches!(err, MarketDataError::NotFound { resource } if resource == "DELISTED"));
    assert!(refresh.summaries[0].is_none());

    // Previous values survive a failed refresh.
    assert_eq!(portfolio.strategies[0].legs[0].greeks, Some(stale));
    assert_eq!(portfolio.strategies[0].current_pnl, dec!(-20));
    assert_eq!(
        refresh.summaries[1].as_ref().unwrap().sources,
        vec![Some(GreeksSource::Stock)]
    );
}
