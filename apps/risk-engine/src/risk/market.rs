//! Market conditions calculator.
//!
//! Turns the caller's benchmark/VIX levels into the one-day move and
//! one-day volatility change the exposure and tail-risk estimators use.

use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::models::MarketConditions;
use crate::pricing::{to_decimal, to_f64};

/// Derived market inputs for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSnapshot {
    /// Expected one-day benchmark move as a fraction of price.
    pub expected_daily_move: Decimal,
    /// Expected one-day benchmark move in price points.
    pub benchmark_move: Decimal,
    /// Assumed one-day change of the volatility index, in vol points.
    pub vol_change: Decimal,
    /// Volatility index level.
    pub vix: Decimal,
}

impl MarketSnapshot {
    /// Derive the snapshot from raw conditions.
    ///
    /// An explicit `expected_daily_move` wins; otherwise it is
    /// `VIX / 100 / sqrt(trading_days)`. The vol change is the observed
    /// one-day VIX change when present, else `VIX × VVIX / 100 / sqrt(trading_days)`.
    #[must_use]
    pub fn from_conditions(conditions: &MarketConditions, config: &RiskConfig) -> Self {
        let expected_daily_move = conditions
            .expected_daily_move
            .unwrap_or_else(|| expected_daily_move(conditions.vix, config.trading_days_per_year));

        let vol_change = conditions.vix_change_1d.unwrap_or_else(|| {
            let daily = to_f64(conditions.vix) * to_f64(conditions.vvix) / 100.0
                / config.trading_days_per_year.sqrt();
            to_decimal(daily)
        });

        Self {
            expected_daily_move,
            benchmark_move: conditions
                .benchmark_price
                .saturating_mul(expected_daily_move),
            vol_change,
            vix: conditions.vix,
        }
    }

    /// One-day move of an underlying with the given beta, in benchmark points.
    ///
    /// Saturates at the `Decimal` range; downstream checked arithmetic
    /// turns a saturated move into a per-strategy failure.
    #[must_use]
    pub fn move_for_beta(&self, beta: Decimal) -> Decimal {
        beta.saturating_mul(self.benchmark_move)
    }
}

/// Annualized VIX level to an expected one-day move fraction.
#[must_use]
pub fn expected_daily_move(vix: Decimal, trading_days_per_year: f64) -> Decimal {
    if trading_days_per_year <= 0.0 {
        return Decimal::ZERO;
    }
    to_decimal(to_f64(vix) / 100.0 / trading_days_per_year.sqrt())
}
