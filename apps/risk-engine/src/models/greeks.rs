//! Options Greeks value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// First/second-order sensitivities of a position.
///
/// Per-contract on a [`Leg`](super::Leg); position-weighted once aggregated
/// onto a strategy or portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta - directional exposure per $1 move of the underlying.
    #[serde(default)]
    pub delta: Decimal,
    /// Gamma - rate of change of delta.
    #[serde(default)]
    pub gamma: Decimal,
    /// Theta - time decay per calendar day.
    #[serde(default)]
    pub theta: Decimal,
    /// Vega - sensitivity to one volatility point.
    #[serde(default)]
    pub vega: Decimal,
}

impl Greeks {
    /// Zero Greeks.
    pub const ZERO: Self = Self {
        delta: Decimal::ZERO,
        gamma: Decimal::ZERO,
        theta: Decimal::ZERO,
        vega: Decimal::ZERO,
    };

    /// Create new Greeks.
    #[must_use]
    pub const fn new(delta: Decimal, gamma: Decimal, theta: Decimal, vega: Decimal) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
        }
    }

    /// Create Greeks with just delta (e.g. a share of stock).
    #[must_use]
    pub fn with_delta(delta: Decimal) -> Self {
        Self {
            delta,
            ..Default::default()
        }
    }

    /// Scale Greeks by a factor (signed size × multiplier, beta, ...).
    #[must_use]
    pub fn scale(&self, factor: Decimal) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
        }
    }

    /// [`scale`](Self::scale) that returns `None` on overflow.
    #[must_use]
    pub fn checked_scale(&self, factor: Decimal) -> Option<Self> {
        Some(Self {
            delta: self.delta.checked_mul(factor)?,
            gamma: self.gamma.checked_mul(factor)?,
            theta: self.theta.checked_mul(factor)?,
            vega: self.vega.checked_mul(factor)?,
        })
    }

    /// Component-wise sum that returns `None` on overflow.
    #[must_use]
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        Some(Self {
            delta: self.delta.checked_add(rhs.delta)?,
            gamma: self.gamma.checked_add(rhs.gamma)?,
            theta: self.theta.checked_add(rhs.theta)?,
            vega: self.vega.checked_add(rhs.vega)?,
        })
    }

    /// Largest absolute component.
    #[must_use]
    pub fn max_abs(&self) -> Decimal {
        self.delta
            .abs()
            .max(self.gamma.abs())
            .max(self.theta.abs())
            .max(self.vega.abs())
    }

    /// Whether every sensitivity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.delta.is_zero() && self.gamma.is_zero() && self.theta.is_zero() && self.vega.is_zero()
    }
}

impl Add for Greeks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            delta: self.delta + rhs.delta,
            gamma: self.gamma + rhs.gamma,
            theta: self.theta + rhs.theta,
            vega: self.vega + rhs.vega,
        }
    }
}

impl AddAssign for Greeks {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Greeks {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn greeks_default_is_zero() {
        assert_eq!(Greeks::default(), Greeks::ZERO);
        assert!(Greeks::default().is_zero());
    }

    #[test]
    fn greeks_with_delta() {
        let g = Greeks::with_delta(dec!(0.65));
        assert_eq!(g.delta, dec!(0.65));
        assert_eq!(g.gamma, Decimal::ZERO);
        assert!(!g.is_zero());
    }

    #[test]
    fn greeks_scale_signed() {
        let g = Greeks::new(dec!(0.5), dec!(0.01), dec!(-5), dec!(10));

        // Long 10 contracts
        let long = g.scale(dec!(10));
        assert_eq!(long.delta, dec!(5));
        assert_eq!(long.gamma, dec!(0.1));
        assert_eq!(long.theta, dec!(-50));

        // Short 5 contracts
        let short = g.scale(dec!(-5));
        assert_eq!(short.delta, dec!(-2.5));
        assert_eq!(short.vega, dec!(-50));
    }

    #[test]
    fn greeks_add_and_sum() {
        let g1 = Greeks::new(dec!(0.30), dec!(0.03), dec!(-5), dec!(10));
        let g2 = Greeks::new(dec!(0.20), dec!(0.02), dec!(-3), dec!(5));

        let sum = g1 + g2;
        assert_eq!(sum.delta, dec!(0.50));
        assert_eq!(sum.theta, dec!(-8));

        let total: Greeks = vec![g1, g2, Greeks::ZERO].into_iter().sum();
        assert_eq!(total, sum);

        let mut acc = Greeks::ZERO;
        acc += g1;
        acc += g2;
        assert_eq!(acc, sum);
    }

    #[test]
    fn checked_ops_detect_overflow() {
        let g = Greeks::new(dec!(0.5), dec!(-0.02), dec!(-3), dec!(12));
        assert_eq!(g.checked_scale(dec!(-2)), Some(g.scale(dec!(-2))));
        assert_eq!(g.checked_add(&g), Some(g + g));
        assert_eq!(g.max_abs(), dec!(12));

        let huge = Greeks::with_delta(Decimal::MAX);
        assert_eq!(huge.checked_scale(dec!(2)), None);
        assert_eq!(huge.checked_add(&huge), None);
    }

    #[test]
    fn greeks_serde_defaults_missing_fields() {
        let parsed: Greeks = serde_json::from_str(r#"{"delta": "0.5"}"#).unwrap();
        assert_eq!(parsed.delta, dec!(0.5));
        assert_eq!(parsed.vega, Decimal::ZERO);
    }
}
