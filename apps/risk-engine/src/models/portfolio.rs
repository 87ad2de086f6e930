//! Portfolio snapshot read and rewritten once per refresh cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::risk_profile::ExpectedDailyMove;
use super::strategy::Strategy;

/// One account snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Net liquidation value.
    pub net_liquidation_value: Decimal,
    /// Cash balance.
    #[serde(default)]
    pub cash: Decimal,
    /// Sum of strategy margin.
    #[serde(default)]
    pub margin_used: Decimal,
    /// Maximum margin the account may use.
    #[serde(default)]
    pub max_margin: Decimal,
    /// Σ beta × delta.
    #[serde(default)]
    pub beta_weighted_delta: Decimal,
    /// Σ beta × gamma.
    #[serde(default)]
    pub beta_weighted_gamma: Decimal,
    /// Σ theta.
    #[serde(default)]
    pub theta: Decimal,
    /// Σ vega.
    #[serde(default)]
    pub vega: Decimal,
    /// Expected one-day move decomposition.
    #[serde(default)]
    pub expected_move: ExpectedDailyMove,
    /// Diversified portfolio CVaR.
    #[serde(default)]
    pub cvar: Decimal,
    /// Σ strategy P&L.
    #[serde(default)]
    pub pnl: Decimal,
    /// Strategies in display order.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
}

impl Portfolio {
    /// Create an empty portfolio.
    #[must_use]
    pub fn new(net_liquidation_value: Decimal, cash: Decimal, max_margin: Decimal) -> Self {
        Self {
            net_liquidation_value,
            cash,
            max_margin,
            ..Default::default()
        }
    }

    /// Add a strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Margin used as a percentage of max margin; zero when max margin is zero.
    #[must_use]
    pub fn margin_utilization_pct(&self) -> Decimal {
        percent_of(self.margin_used, self.max_margin)
    }

    /// CVaR as a percentage of net liquidation value; zero when NLV is zero.
    #[must_use]
    pub fn cvar_pct_of_nlv(&self) -> Decimal {
        percent_of(self.cvar, self.net_liquidation_value)
    }

    /// Margin still available (never negative).
    #[must_use]
    pub fn available_margin(&self) -> Decimal {
        (self.max_margin - self.margin_used).max(Decimal::ZERO)
    }
}

fn percent_of(value: Decimal, base: Decimal) -> Decimal {
    if base.is_zero() {
        Decimal::ZERO
    } else {
        value / base * Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ratios_guard_zero_denominators() {
        let mut p = Portfolio::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        p.margin_used = dec!(5000);
        p.cvar = dec!(1000);
        assert_eq!(p.margin_utilization_pct(), Decimal::ZERO);
        assert_eq!(p.cvar_pct_of_nlv(), Decimal::ZERO);
        assert_eq!(p.available_margin(), Decimal::ZERO);
    }

    #[test]
    fn ratios_compute_percentages() {
        let mut p = Portfolio::new(dec!(100000), dec!(40000), dec!(50000));
        p.margin_used = dec!(12500);
        p.cvar = dec!(2000);
        assert_eq!(p.margin_utilization_pct(), dec!(25));
        assert_eq!(p.cvar_pct_of_nlv(), dec!(2));
        assert_eq!(p.available_margin(), dec!(37500));
    }
}
