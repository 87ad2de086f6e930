//! Tail-risk estimator: strategy CVaR, diversified portfolio CVaR, and each
//! strategy's marginal contribution to risk.
//!
//! Cross-strategy correlation is collapsed into one scalar
//! diversification factor. This is a known simplification, not a
//! correlation model.

use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::models::{RiskCategory, Strategy};
use crate::pricing::to_decimal;

use super::error::{RiskError, checked};

/// Portfolio-level tail-risk result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TailRisk {
    /// Σ strategy CVaR before diversification.
    pub gross_cvar: Decimal,
    /// `diversification_factor × gross_cvar`.
    pub portfolio_cvar: Decimal,
    /// MCR per strategy in input order, percent.
    pub mcr_pct: Vec<Decimal>,
}

/// CVaR and MCR calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailRiskEstimator {
    stress_sigma: Decimal,
    defined_cvar_factor: Decimal,
    diversification_factor: Decimal,
}

impl TailRiskEstimator {
    /// Create an estimator from risk configuration.
    #[must_use]
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            stress_sigma: to_decimal(config.stress_sigma),
            defined_cvar_factor: to_decimal(config.defined_cvar_factor),
            diversification_factor: to_decimal(config.diversification_factor),
        }
    }

    /// Strategy CVaR.
    ///
    /// Defined risk is a discounted max loss (`factor × |premium|`).
    /// Undefined risk stresses the one-day exposures by `k` sigma: the
    /// directional term scales by `k`, the convexity term by `k²`. Reads
    /// the strategy's already-computed exposures.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::Overflow` when the stressed loss does not fit.
    pub fn strategy_cvar(&self, strategy: &Strategy) -> Result<Decimal, RiskError> {
        let cvar = match strategy.risk.risk_category {
            RiskCategory::Defined => self.defined_cvar_factor.checked_mul(strategy.premium.abs()),
            RiskCategory::Undefined => {
                let k = self.stress_sigma;
                let directional = k.checked_mul(strategy.risk.expected_delta_move);
                let convexity = k
                    .checked_mul(k)
                    .and_then(|k2| k2.checked_mul(strategy.risk.expected_convexity_move));
                directional
                    .zip(convexity)
                    .and_then(|(d, c)| d.checked_add(c))
                    .map(|loss| loss.abs())
            }
        };
        checked(cvar, "cvar")
    }

    /// Diversified portfolio CVaR and per-strategy MCR from strategy CVaRs.
    ///
    /// MCR sums to 100 when the gross CVaR is positive and is all zero
    /// otherwise.
    #[must_use]
    pub fn portfolio(&self, strategy_cvars: &[Decimal]) -> TailRisk {
        let gross_cvar: Decimal = strategy_cvars.iter().copied().sum();
        let mcr_pct = if gross_cvar > Decimal::ZERO {
            strategy_cvars
                .iter()
                .map(|&cvar| cvar / gross_cvar * Decimal::ONE_HUNDRED)
                .collect()
        } else {
            vec![Decimal::ZERO; strategy_cvars.len()]
        };

        TailRisk {
            gross_cvar,
            portfolio_cvar: self.diversification_factor * gross_cvar,
            mcr_pct,
        }
    }
}

impl Default for TailRiskEstimator {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Leg, OptionType, StrategyType};
    use rust_decimal_macros::dec;

    fn strategy(category: RiskCategory, premium: Decimal) -> Strategy {
        Strategy::builder("XYZ", StrategyType::Custom)
            .leg(Leg::option(OptionType::Call, dec!(100), 30, dec!(-1), premium))
            .risk_category(category)
            .build()
            .unwrap()
    }

    #[test]
    fn defined_risk_credit_cvar() {
        let s = strategy(RiskCategory::Defined, dec!(-1500));
        assert_eq!(TailRiskEstimator::default().strategy_cvar(&s).unwrap(), dec!(1350));
    }

    #[test]
    fn undefined_risk_scales_convexity_by_k_squared() {
        let mut s = strategy(RiskCategory::Undefined, dec!(-400));
        s.risk.expected_delta_move = dec!(-20);
        s.risk.expected_convexity_move = dec!(-5);
        // |3 × -20 + 9 × -5| = 105
        assert_eq!(TailRiskEstimator::default().strategy_cvar(&s).unwrap(), dec!(105));
    }

    #[test]
    fn undefined_risk_terms_can_offset() {
        let mut s = strategy(RiskCategory::Undefined, dec!(-400));
        s.risk.expected_delta_move = dec!(30);
        s.risk.expected_convexity_move = dec!(-10);
        assert_eq!(TailRiskEstimator::default().strategy_cvar(&s).unwrap(), dec!(0));
    }

    #[test]
    fn stressed_loss_overflow_is_an_error() {
        let mut s = strategy(RiskCategory::Undefined, dec!(-400));
        s.risk.expected_convexity_move = Decimal::MAX / dec!(2);
        assert_eq!(
            TailRiskEstimator::default().strategy_cvar(&s),
            Err(RiskError::Overflow { quantity: "cvar" })
        );
    }

    #[test]
    fn portfolio_cvar_and_mcr() {
        let tail = TailRiskEstimator::default().portfolio(&[dec!(1350), dec!(900)]);
        assert_eq!(tail.gross_cvar, dec!(2250));
        assert_eq!(tail.portfolio_cvar, dec!(1912.5));
        assert_eq!(tail.mcr_pct, vec![dec!(60), dec!(40)]);
    }

    #[test]
    fn zero_total_cvar_zeroes_mcr() {
        let tail = TailRiskEstimator::default().portfolio(&[Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(tail.portfolio_cvar, Decimal::ZERO);
        assert_eq!(tail.mcr_pct, vec![Decimal::ZERO, Decimal::ZERO]);
    }

    #[test]
    fn empty_portfolio() {
        let tail = TailRiskEstimator::default().portfolio(&[]);
        assert_eq!(tail, TailRisk::default());
    }
}
