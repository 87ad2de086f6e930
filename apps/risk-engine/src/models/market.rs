//! Market conditions supplied by the caller for one refresh cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Benchmark and volatility-index levels for one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Benchmark spot price (e.g. SPY).
    pub benchmark_price: Decimal,
    /// Implied-volatility index level (VIX-equivalent, in points).
    pub vix: Decimal,
    /// Volatility of the volatility index (VVIX-equivalent, in points).
    #[serde(default)]
    pub vvix: Decimal,
    /// Observed one-day move of the volatility index, in points.
    #[serde(default)]
    pub vix_change_1d: Option<Decimal>,
    /// Explicit expected one-day benchmark move as a fraction (0.0126 = 1.26%).
    #[serde(default)]
    pub expected_daily_move: Option<Decimal>,
}

impl MarketConditions {
    /// Conditions with just a benchmark price and VIX level.
    #[must_use]
    pub fn new(benchmark_price: Decimal, vix: Decimal) -> Self {
        Self {
            benchmark_price,
            vix,
            ..Default::default()
        }
    }

    /// Set the VVIX level.
    #[must_use]
    pub const fn with_vvix(mut self, vvix: Decimal) -> Self {
        self.vvix = vvix;
        self
    }

    /// Set the observed one-day VIX change.
    #[must_use]
    pub const fn with_vix_change(mut self, change: Decimal) -> Self {
        self.vix_change_1d = Some(change);
        self
    }

    /// Override the expected one-day move.
    #[must_use]
    pub const fn with_expected_daily_move(mut self, fraction: Decimal) -> Self {
        self.expected_daily_move = Some(fraction);
        self
    }
}
