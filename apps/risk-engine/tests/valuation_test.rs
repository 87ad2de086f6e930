//! Valuation Analyzer Integration Tests
//!
//! Theoretical value, breakevens and probability of profit for common
//! option structures, plus the kernel identities they rely on.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use risk_engine::config::{EngineConfig, PricingConfig, ValuationConfig};
use risk_engine::models::{OptionType, StrategyType};
use risk_engine::pricing::{IvQuery, IvSolver, OptionInputs, OptionKind, price_option};
use risk_engine::valuation::{BreakevenMethod, ProfitRegion, ValuationError};
use risk_engine::{Leg, Portfolio, Strategy, ValuationAnalyzer, ValuationInputs};

fn analyzer() -> ValuationAnalyzer {
    ValuationAnalyzer::new(
        PricingConfig {
            risk_free_rate: 0.03,
            ..PricingConfig::default()
        },
        ValuationConfig::default(),
    )
}

fn inputs(spot: Decimal) -> ValuationInputs {
    ValuationInputs::new(spot).with_volatility(dec!(0.20))
}

fn close(actual: Decimal, expected: Decimal) -> bool {
    (actual - expected).abs() < dec!(0.000001)
}

#[test]
fn iron_condor_uses_analytic_breakevens() {
    let condor = Strategy::builder("SPY", StrategyType::IronCondor)
        .leg(Leg::option(OptionType::Put, dec!(90), 30, dec!(1), dec!(50)))
        .leg(Leg::option(OptionType::Put, dec!(95), 30, dec!(-1), dec!(-100)))
        .leg(Leg::option(OptionType::Call, dec!(105), 30, dec!(-1), dec!(-100)))
        .leg(Leg::option(OptionType::Call, dec!(110), 30, dec!(1), dec!(50)))
        .build()
        .unwrap();

    let report = analyzer().analyze(&condor, &inputs(dec!(100))).unwrap();

    assert_eq!(report.breakeven_method, BreakevenMethod::Analytic);
    assert_eq!(report.breakevens, vec![dec!(94), dec!(106)]);
    assert_eq!(report.profit_region, ProfitRegion::Between);
    assert!(report.probability_of_profit > dec!(0.5));
    assert!(report.probability_of_profit < Decimal::ONE);
}

#[test]
fn credit_put_spread_profits_above_breakeven() {
    let spread = Strategy::builder("SPY", StrategyType::BullPutSpread)
        .leg(Leg::option(OptionType::Put, dec!(95), 30, dec!(-1), dec!(-150)))
        .leg(Leg::option(OptionType::Put, dec!(90), 30, dec!(1), dec!(50)))
        .build()
        .unwrap();

    let report = analyzer().analyze(&spread, &inputs(dec!(100))).unwrap();

    assert_eq!(report.breakevens, vec![dec!(94)]);
    assert_eq!(report.profit_region, ProfitRegion::Above);
    assert!(report.probability_of_profit > dec!(0.7));
}

#[test]
fn full_width_debit_spread_never_profits() {
    let spread = Strategy::builder("SPY", StrategyType::BullCallSpread)
        .leg(Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(700)))
        .leg(Leg::option(OptionType::Call, dec!(105), 30, dec!(-1), dec!(-200)))
        .build()
        .unwrap();

    let report = analyzer().analyze(&spread, &inputs(dec!(100))).unwrap();

    assert_eq!(report.breakevens, vec![dec!(105)]);
    assert_eq!(report.profit_region, ProfitRegion::Unprofitable);
    assert_eq!(report.probability_of_profit, Decimal::ZERO);
}

#[test]
fn long_straddle_scans_two_breakevens() {
    let straddle = Strategy::builder("SPY", StrategyType::LongStraddle)
        .leg(Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(250)))
        .leg(Leg::option(OptionType::Put, dec!(100), 30, dec!(1), dec!(250)))
        .build()
        .unwrap();

    let report = analyzer().analyze(&straddle, &inputs(dec!(100))).unwrap();

    assert_eq!(report.breakeven_method, BreakevenMethod::NumericScan);
    assert_eq!(report.breakevens.len(), 2);
    assert!(close(report.breakevens[0], dec!(95)));
    assert!(close(report.breakevens[1], dec!(105)));
    assert_eq!(report.profit_region, ProfitRegion::Outside);
}

#[test]
fn stock_only_strategy_values_at_spot() {
    let shares = Strategy::builder("KO", StrategyType::LongStock)
        .leg(Leg::stock(dec!(100), dec!(6000)))
        .build()
        .unwrap();

    let report = analyzer().analyze(&shares, &inputs(dec!(62))).unwrap();

    assert_eq!(report.theoretical_value, dec!(6200));
    assert_eq!(report.expected_value, dec!(200));
    assert_eq!(report.breakevens.len(), 1);
    assert!(close(report.breakevens[0], dec!(60)));
    assert_eq!(report.profit_region, ProfitRegion::Above);
}

#[test]
fn portfolio_valuation_reports_missing_inputs() {
    let portfolio = Portfolio::new(dec!(100000), dec!(50000), dec!(50000))
        .with_strategy(
            Strategy::builder("SPY", StrategyType::LongCall)
                .leg(Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(250)))
                .build()
                .unwrap(),
        )
        .with_strategy(
            Strategy::builder("NVDA", StrategyType::LongPut)
                .leg(Leg::option(OptionType::Put, dec!(120), 30, dec!(1), dec!(400)))
                .build()
                .unwrap(),
        );

    let analyzer = ValuationAnalyzer::from_config(&EngineConfig::default());
    let quotes = HashMap::from([("SPY".to_string(), inputs(dec!(100)))]);
    let valuation = analyzer.analyze_portfolio(&portfolio, &quotes);

    assert_eq!(valuation.reports.len(), 1);
    assert_eq!(valuation.failures.len(), 1);
    assert!(valuation.failures[0].reason.contains("NVDA"));

    let direct = analyzer.analyze(&portfolio.strategies[1], &ValuationInputs::new(dec!(-1)));
    assert!(matches!(direct, Err(ValuationError::InvalidSpot { .. })));
}

#[test]
fn put_call_parity_holds() {
    let base = OptionInputs {
        spot: 100.0,
        strike: 100.0,
        time_to_expiry: 30.0 / 365.0,
        rate: 0.03,
        dividend_yield: 0.0,
        volatility: 0.20,
        kind: OptionKind::Call,
    };
    let call = price_option(&base).unwrap();
    let put = price_option(&OptionInputs {
        kind: OptionKind::Put,
        ..base
    })
    .unwrap();

    let forward_gap = base.spot - base.strike * (-base.rate * base.time_to_expiry).exp();
    assert!((call.price - put.price - forward_gap).abs() < 1e-9);
    assert!((call.delta - put.delta - 1.0).abs() < 1e-12);
}

#[test]
fn implied_volatility_recovers_pricing_volatility() {
    let query = IvQuery {
        market_price: 2.409_581_446_079_464_2,
        spot: 100.0,
        strike: 100.0,
        time_to_expiry: 30.0 / 365.0,
        rate: 0.03,
        dividend_yield: 0.0,
        kind: OptionKind::Call,
    };

    let solution = IvSolver::default().solve(&query).unwrap();
    assert!((solution.volatility - 0.20).abs() < 1e-6);
    assert!(solution.iterations > 0);
}
