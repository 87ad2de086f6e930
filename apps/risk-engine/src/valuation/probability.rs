//! Profit-region classification and probability of profit.

use serde::{Deserialize, Serialize};

use crate::pricing::{PricingError, prob_above};

/// Probability of profit assigned to shapes that cannot be classified.
pub const COMPLEX_PROBABILITY: f64 = 0.5;

/// Where the underlying must finish for the strategy to make money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitRegion {
    /// Above the single breakeven.
    Above,
    /// Below the single breakeven.
    Below,
    /// Between the two breakevens.
    Between,
    /// Below the lower or above the upper breakeven.
    Outside,
    /// No breakeven or more than two; probability defaults to 0.5.
    Complex,
    /// The payoff touches zero but never rises above it.
    Unprofitable,
}

/// Classify the profitable region by probing the payoff around the
/// breakevens (ascending).
///
/// A probe counts as profitable only when it clears `tolerance`, so a
/// payoff whose maximum is exactly zero is `Unprofitable` rather than
/// decided by rounding noise.
pub(crate) fn classify<F>(
    breakevens: &[f64],
    tolerance: f64,
    pnl_at: F,
) -> Result<ProfitRegion, PricingError>
where
    F: Fn(f64) -> Result<f64, PricingError>,
{
    let profitable = |x: f64| pnl_at(x).map(|pnl| pnl > tolerance);
    let region = match breakevens {
        [b] => {
            if profitable(b * 1.01)? {
                ProfitRegion::Above
            } else if profitable(b * 0.99)? {
                ProfitRegion::Below
            } else {
                ProfitRegion::Unprofitable
            }
        }
        [low, high] => {
            if profitable(low.midpoint(*high))? {
                ProfitRegion::Between
            } else if profitable(low * 0.99)? || profitable(high * 1.01)? {
                ProfitRegion::Outside
            } else {
                ProfitRegion::Unprofitable
            }
        }
        _ => ProfitRegion::Complex,
    };
    Ok(region)
}

/// Model parameters for the terminal distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Terminal {
    pub spot: f64,
    pub years: f64,
    pub rate: f64,
    pub dividend_yield: f64,
    pub volatility: f64,
}

impl Terminal {
    fn above(&self, level: f64) -> f64 {
        prob_above(
            self.spot,
            level,
            self.years,
            self.rate,
            self.dividend_yield,
            self.volatility,
        )
    }
}

/// Risk-neutral probability of finishing in the profitable region.
pub(crate) fn probability_of_profit(
    region: ProfitRegion,
    breakevens: &[f64],
    terminal: &Terminal,
) -> f64 {
    let p = match (region, breakevens) {
        (ProfitRegion::Above, [b]) => terminal.above(*b),
        (ProfitRegion::Below, [b]) => 1.0 - terminal.above(*b),
        (ProfitRegion::Between, [low, high]) => terminal.above(*low) - terminal.above(*high),
        (ProfitRegion::Outside, [low, high]) => {
            1.0 - (terminal.above(*low) - terminal.above(*high))
        }
        (ProfitRegion::Unprofitable, _) => 0.0,
        _ => COMPLEX_PROBABILITY,
    };
    p.clamp(0.0, 1.0)
}
