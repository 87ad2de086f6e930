//! Survival estimator: probability of reaching 10/25/50% of max profit
//! before max loss.
//!
//! A base table keyed by (risk category, directional view) with Greek
//! tilts on top. Results always go through
//! [`SurvivalProbabilities::clamped`], so tilts can never invert the order.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SurvivalConfig;
use crate::models::{DirectionalAssumption, Greeks, RiskCategory, SurvivalProbabilities};
use crate::pricing::to_decimal;

/// Base (P10, P25, P50) for a category and view.
#[must_use]
pub fn base_probabilities(
    category: RiskCategory,
    direction: DirectionalAssumption,
) -> (Decimal, Decimal, Decimal) {
    match (category, direction.is_directional()) {
        (RiskCategory::Defined, false) => (dec!(0.72), dec!(0.42), dec!(0.18)),
        (RiskCategory::Defined, true) => (dec!(0.62), dec!(0.38), dec!(0.20)),
        (RiskCategory::Undefined, false) => (dec!(0.75), dec!(0.45), dec!(0.17)),
        (RiskCategory::Undefined, true) => (dec!(0.60), dec!(0.35), dec!(0.22)),
    }
}

/// Table lookup plus theta/gamma tilts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurvivalEstimator {
    theta_p10: Decimal,
    theta_p25: Decimal,
    gamma_p50: Decimal,
}

impl SurvivalEstimator {
    /// Create an estimator from configured tilt sizes.
    #[must_use]
    pub fn new(config: &SurvivalConfig) -> Self {
        Self {
            theta_p10: to_decimal(config.theta_p10_tilt),
            theta_p25: to_decimal(config.theta_p25_tilt),
            gamma_p50: to_decimal(config.gamma_p50_tilt),
        }
    }

    /// Estimate survival probabilities.
    ///
    /// Positive theta lifts the early milestones; short gamma lowers P50,
    /// long gamma raises it.
    #[must_use]
    pub fn estimate(
        &self,
        category: RiskCategory,
        direction: DirectionalAssumption,
        greeks: &Greeks,
    ) -> SurvivalProbabilities {
        let (mut p10, mut p25, mut p50) = base_probabilities(category, direction);

        if greeks.theta > Decimal::ZERO {
            p10 += self.theta_p10;
            p25 += self.theta_p25;
        }
        if greeks.gamma < Decimal::ZERO {
            p50 -= self.gamma_p50;
        } else if greeks.gamma > Decimal::ZERO {
            p50 += self.gamma_p50;
        }

        SurvivalProbabilities::clamped(p10, p25, p50)
    }
}

impl Default for SurvivalEstimator {
    fn default() -> Self {
        Self::new(&SurvivalConfig::default())
    }
}
