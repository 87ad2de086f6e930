//! Risk outputs attached to strategies and portfolios.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Whether a strategy's maximum loss is capped by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Maximum loss is bounded (spreads, long options).
    Defined,
    /// Maximum loss is theoretically unbounded (naked short options, stock).
    #[default]
    Undefined,
}

/// Probability of reaching 10/25/50% of max profit before max loss.
///
/// Invariant: `p10 >= p25 >= p50 >= 0`, all within `[0, 1]`. Only
/// [`SurvivalProbabilities::clamped`] constructs values, deserialization
/// included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawSurvival")]
pub struct SurvivalProbabilities {
    p10: Decimal,
    p25: Decimal,
    p50: Decimal,
}

#[derive(Deserialize)]
struct RawSurvival {
    #[serde(default)]
    p10: Decimal,
    #[serde(default)]
    p25: Decimal,
    #[serde(default)]
    p50: Decimal,
}

impl From<RawSurvival> for SurvivalProbabilities {
    fn from(raw: RawSurvival) -> Self {
        Self::clamped(raw.p10, raw.p25, raw.p50)
    }
}

impl SurvivalProbabilities {
    /// All-zero probabilities (empty or failed strategies).
    pub const ZERO: Self = Self {
        p10: Decimal::ZERO,
        p25: Decimal::ZERO,
        p50: Decimal::ZERO,
    };

    /// Build probabilities, clamping into `[0, 1]` and then forcing
    /// `p10 >= p25 >= p50` by lowering the later milestones.
    #[must_use]
    pub fn clamped(p10: Decimal, p25: Decimal, p50: Decimal) -> Self {
        let unit = |p: Decimal| p.max(Decimal::ZERO).min(Decimal::ONE);
        let p10 = unit(p10);
        let p25 = unit(p25).min(p10);
        let p50 = unit(p50).min(p25);
        Self { p10, p25, p50 }
    }

    /// Probability of reaching 10% of max profit first.
    #[must_use]
    pub const fn p10(&self) -> Decimal {
        self.p10
    }

    /// Probability of reaching 25% of max profit first.
    #[must_use]
    pub const fn p25(&self) -> Decimal {
        self.p25
    }

    /// Probability of reaching 50% of max profit first.
    #[must_use]
    pub const fn p50(&self) -> Decimal {
        self.p50
    }

    /// Whether the monotonic invariant holds.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.p10 >= self.p25 && self.p25 >= self.p50 && self.p50 >= Decimal::ZERO
    }
}

/// One day's expected dollar move, decomposed by Greek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectedDailyMove {
    /// `delta × m`.
    pub directional: Decimal,
    /// `0.5 × gamma × m²`.
    pub convexity: Decimal,
    /// Theta (one day of decay).
    pub time_decay: Decimal,
    /// `vega × assumed one-day vol change`.
    pub volatility: Decimal,
}

impl ExpectedDailyMove {
    /// Sum of all components.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.directional + self.convexity + self.time_decay + self.volatility
    }
}

impl Add for ExpectedDailyMove {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            directional: self.directional + rhs.directional,
            convexity: self.convexity + rhs.convexity,
            time_decay: self.time_decay + rhs.time_decay,
            volatility: self.volatility + rhs.volatility,
        }
    }
}

impl AddAssign for ExpectedDailyMove {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Risk metrics owned by a strategy and rewritten on every engine pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Defined or undefined risk.
    pub risk_category: RiskCategory,
    /// Estimated margin requirement.
    #[serde(default)]
    pub margin: Decimal,
    /// Expected one-day directional move (`delta × m`).
    #[serde(default)]
    pub expected_delta_move: Decimal,
    /// Expected one-day convexity move (`0.5 × gamma × m²`).
    #[serde(default)]
    pub expected_convexity_move: Decimal,
    /// Conditional value at risk.
    #[serde(default)]
    pub cvar: Decimal,
    /// Marginal contribution to portfolio risk, percent (0-100).
    #[serde(default)]
    pub mcr_pct: Decimal,
    /// Profit-milestone survival probabilities.
    #[serde(default)]
    pub survival: SurvivalProbabilities,
}

impl RiskProfile {
    /// Create an empty profile in the given category.
    #[must_use]
    pub fn new(risk_category: RiskCategory) -> Self {
        Self {
            risk_category,
            ..Default::default()
        }
    }

    /// Zero every computed field, keeping the category.
    pub fn reset(&mut self) {
        *self = Self::new(self.risk_category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn clamped_enforces_ordering() {
        let s = SurvivalProbabilities::clamped(dec!(0.40), dec!(0.55), dec!(0.60));
        assert_eq!(s.p10(), dec!(0.40));
        assert_eq!(s.p25(), dec!(0.40));
        assert_eq!(s.p50(), dec!(0.40));
        assert!(s.is_monotonic());
    }

    #[test]
    fn clamped_bounds_to_unit_interval() {
        let s = SurvivalProbabilities::clamped(dec!(1.2), dec!(0.5), dec!(-0.1));
        assert_eq!(s.p10(), Decimal::ONE);
        assert_eq!(s.p25(), dec!(0.5));
        assert_eq!(s.p50(), Decimal::ZERO);
        assert!(s.is_monotonic());
    }

    #[test]
    fn deserialized_values_are_clamped() {
        let s: SurvivalProbabilities =
            serde_json::from_str(r#"{"p10": "0.2", "p25": "0.5", "p50": "1.4"}"#).unwrap();
        assert!(s.is_monotonic());
        assert_eq!(s.p10(), dec!(0.2));
        assert_eq!(s.p25(), dec!(0.2));
        assert_eq!(s.p50(), dec!(0.2));

        let valid = SurvivalProbabilities::clamped(dec!(0.7), dec!(0.4), dec!(0.2));
        let json = serde_json::to_string(&valid).unwrap();
        assert_eq!(serde_json::from_str::<SurvivalProbabilities>(&json).unwrap(), valid);
    }

    #[test]
    fn expected_move_total_and_add() {
        let a = ExpectedDailyMove {
            directional: dec!(10),
            convexity: dec!(2),
            time_decay: dec!(5),
            volatility: dec!(-3),
        };
        let b = ExpectedDailyMove {
            directional: dec!(-4),
            ..Default::default()
        };
        assert_eq!(a.total(), dec!(14));
        assert_eq!((a + b).directional, dec!(6));
    }

    #[test]
    fn reset_keeps_category() {
        let mut profile = RiskProfile {
            margin: dec!(1000),
            cvar: dec!(900),
            ..RiskProfile::new(RiskCategory::Defined)
        };
        profile.reset();
        assert_eq!(profile.risk_category, RiskCategory::Defined);
        assert_eq!(profile.margin, Decimal::ZERO);
        assert_eq!(profile.cvar, Decimal::ZERO);
    }
}
