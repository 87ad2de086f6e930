//! Greeks aggregation: legs into strategies, strategies into the portfolio.

use rust_decimal::Decimal;

use crate::models::{Greeks, Leg, Strategy};

use super::error::RiskError;

/// Strategy totals plus the legs whose Greeks were absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrategyGreeks {
    /// Position-weighted Greeks summed over legs.
    pub greeks: Greeks,
    /// Indices of option legs that contributed zero for lack of Greeks.
    pub missing_legs: Vec<usize>,
}

/// Beta-weighted portfolio Greeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortfolioGreeks {
    /// Σ beta × delta.
    pub beta_weighted_delta: Decimal,
    /// Σ beta × gamma.
    pub beta_weighted_gamma: Decimal,
    /// Σ theta (unweighted).
    pub theta: Decimal,
    /// Σ vega (unweighted).
    pub vega: Decimal,
}

/// Sum `greek × size × multiplier` over legs.
///
/// An empty slice yields zero Greeks.
///
/// # Errors
///
/// Returns `RiskError::Overflow` when a weighted Greek does not fit.
pub fn aggregate_strategy_greeks(legs: &[Leg]) -> Result<StrategyGreeks, RiskError> {
    let mut totals = StrategyGreeks::default();
    for (idx, leg) in legs.iter().enumerate() {
        if leg.unit_greeks().is_none() {
            totals.missing_legs.push(idx);
        }
        let weighted = leg
            .checked_weighted_greeks()
            .ok_or(RiskError::Overflow { quantity: "leg greeks" })?;
        totals.greeks = totals
            .greeks
            .checked_add(&weighted)
            .ok_or(RiskError::Overflow { quantity: "strategy greeks" })?;
    }
    Ok(totals)
}

/// Beta-weight delta and gamma, sum theta and vega as-is.
#[must_use]
pub fn aggregate_portfolio_greeks<'a, I>(strategies: I) -> PortfolioGreeks
where
    I: IntoIterator<Item = &'a Strategy>,
{
    strategies
        .into_iter()
        .fold(PortfolioGreeks::default(), |mut acc, s| {
            acc.beta_weighted_delta += s.beta * s.greeks.delta;
            acc.beta_weighted_gamma += s.beta * s.greeks.gamma;
            acc.theta += s.greeks.theta;
            acc.vega += s.greeks.vega;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptionType, StrategyType};
    use rust_decimal_macros::dec;

    #[test]
    fn empty_strategy_has_zero_greeks() {
        let totals = aggregate_strategy_greeks(&[]).unwrap();
        assert_eq!(totals.greeks, Greeks::ZERO);
        assert!(totals.missing_legs.is_empty());
    }

    #[test]
    fn covered_call_nets_delta() {
        let legs = vec![
            Leg::stock(dec!(100), dec!(15000)),
            Leg::option(OptionType::Call, dec!(155), 30, dec!(-1), dec!(-250))
                .with_greeks(Greeks::new(dec!(0.3), dec!(0.02), dec!(-0.04), dec!(0.15))),
        ];
        let totals = aggregate_strategy_greeks(&legs).unwrap();
        assert_eq!(totals.greeks.delta, dec!(70));
        assert_eq!(totals.greeks.gamma, dec!(-2));
        assert_eq!(totals.greeks.theta, dec!(4));
        assert_eq!(totals.greeks.vega, dec!(-15));
    }

    #[test]
    fn missing_option_greeks_are_reported() {
        let legs = vec![
            Leg::option(OptionType::Put, dec!(95), 30, dec!(-1), dec!(-200)),
            Leg::option(OptionType::Put, dec!(90), 30, dec!(1), dec!(80))
                .with_greeks(Greeks::new(dec!(-0.1), dec!(0.01), dec!(-0.02), dec!(0.05))),
        ];
        let totals = aggregate_strategy_greeks(&legs).unwrap();
        assert_eq!(totals.missing_legs, vec![0]);
        assert_eq!(totals.greeks.delta, dec!(-10));
    }

    #[test]
    fn overflowing_greeks_are_an_error() {
        let huge = Greeks::with_delta(Decimal::MAX / dec!(10));
        let legs = vec![
            Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(300)).with_greeks(huge),
        ];
        assert_eq!(
            aggregate_strategy_greeks(&legs),
            Err(RiskError::Overflow { quantity: "leg greeks" })
        );
    }

    #[test]
    fn portfolio_beta_weights_delta_and_gamma_only() {
        let mut a = Strategy::builder("AAPL", StrategyType::LongStock)
            .beta(dec!(1.2))
            .leg(Leg::stock(dec!(100), dec!(15000)))
            .build()
            .unwrap();
        a.greeks = Greeks::new(dec!(100), dec!(1), dec!(-5), dec!(10));
        let mut b = a.clone();
        b.beta = dec!(0.5);
        b.greeks = Greeks::new(dec!(-40), dec!(-2), dec!(3), dec!(-4));

        let totals = aggregate_portfolio_greeks([&a, &b]);
        assert_eq!(totals.beta_weighted_delta, dec!(100));
        assert_eq!(totals.beta_weighted_gamma, dec!(0.2));
        assert_eq!(totals.theta, dec!(-2));
        assert_eq!(totals.vega, dec!(6));
    }
}
