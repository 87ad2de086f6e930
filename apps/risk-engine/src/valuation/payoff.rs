//! Strategy value as a function of the underlying price at a horizon.

use crate::config::PricingConfig;
use crate::models::{LegKind, ModelError, Strategy};
use crate::pricing::{OptionInputs, OptionKind, PricingError, price_option, to_f64};

#[derive(Debug, Clone, Copy)]
enum Instrument {
    Stock,
    Option { kind: OptionKind, strike: f64 },
}

#[derive(Debug, Clone, Copy)]
struct LegPayoff {
    instrument: Instrument,
    /// Signed size × multiplier.
    units: f64,
    /// Years left after the horizon.
    years: f64,
    volatility: f64,
}

/// Strategy payoff with every leg rolled forward to one horizon.
#[derive(Debug, Clone)]
pub(crate) struct PayoffModel {
    legs: Vec<LegPayoff>,
    premium: f64,
    rate: f64,
    dividend_yield: f64,
}

impl PayoffModel {
    /// Build the payoff `horizon_days` from now.
    ///
    /// Legs expiring at or before the horizon are worth intrinsic value;
    /// later legs keep their remaining time value.
    pub(crate) fn new(
        strategy: &Strategy,
        horizon_days: u32,
        fallback_volatility: f64,
        pricing: &PricingConfig,
    ) -> Result<Self, ModelError> {
        let legs = strategy
            .legs
            .iter()
            .enumerate()
            .map(|(leg_index, leg)| {
                let instrument = match leg.kind {
                    LegKind::Stock => Instrument::Stock,
                    LegKind::Option => {
                        let Some(option_type) = leg.option_type else {
                            return Err(ModelError::MissingOptionType { leg_index });
                        };
                        let Some(strike) = leg.strike else {
                            return Err(ModelError::InvalidStrike {
                                leg_index,
                                strike: None,
                            });
                        };
                        Instrument::Option {
                            kind: option_type.into(),
                            strike: to_f64(strike),
                        }
                    }
                };
                let remaining = leg.days_to_expiry.saturating_sub(horizon_days);
                Ok(LegPayoff {
                    instrument,
                    units: to_f64(leg.exposure_factor()),
                    years: pricing.years(remaining),
                    volatility: leg
                        .implied_volatility
                        .map_or(fallback_volatility, to_f64),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            legs,
            premium: to_f64(strategy.premium),
            rate: pricing.risk_free_rate,
            dividend_yield: pricing.dividend_yield,
        })
    }

    /// Net premium the payoff is measured against.
    pub(crate) const fn premium(&self) -> f64 {
        self.premium
    }

    /// Market value of all legs when the underlying is at `spot`.
    pub(crate) fn value_at(&self, spot: f64) -> Result<f64, PricingError> {
        self.legs.iter().try_fold(0.0, |total, leg| {
            let unit_value = match leg.instrument {
                Instrument::Stock => spot,
                Instrument::Option { kind, strike } => {
                    price_option(&OptionInputs {
                        spot,
                        strike,
                        time_to_expiry: leg.years,
                        rate: self.rate,
                        dividend_yield: self.dividend_yield,
                        volatility: leg.volatility,
                        kind,
                    })?
                    .price
                }
            };
            Ok(total + unit_value * leg.units)
        })
    }

    /// Value minus premium.
    pub(crate) fn pnl_at(&self, spot: f64) -> Result<f64, PricingError> {
        Ok(self.value_at(spot)? - self.premium)
    }
}

/// Days until the nearest option expiry, or `stock_horizon` when the
/// strategy holds no options.
pub(crate) fn horizon_days(strategy: &Strategy, stock_horizon: u32) -> u32 {
    strategy
        .option_legs()
        .map(|l| l.days_to_expiry)
        .min()
        .unwrap_or(stock_horizon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Leg, OptionType, StrategyType};
    use rust_decimal_macros::dec;

    #[test]
    fn expired_legs_pay_intrinsic() {
        let s = Strategy::builder("SPY", StrategyType::BullCallSpread)
            .leg(Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(400)))
            .leg(Leg::option(OptionType::Call, dec!(110), 30, dec!(-1), dec!(-100)))
            .build()
            .unwrap();
        let payoff = PayoffModel::new(&s, 30, 0.2, &PricingConfig::default()).unwrap();

        assert!((payoff.value_at(95.0).unwrap()).abs() < 1e-12);
        assert!((payoff.value_at(105.0).unwrap() - 500.0).abs() < 1e-9);
        assert!((payoff.value_at(130.0).unwrap() - 1000.0).abs() < 1e-9);
        assert!((payoff.pnl_at(103.0).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn stock_leg_is_linear() {
        let s = Strategy::builder("AAPL", StrategyType::LongStock)
            .leg(Leg::stock(dec!(100), dec!(15000)))
            .build()
            .unwrap();
        let payoff = PayoffModel::new(&s, 30, 0.2, &PricingConfig::default()).unwrap();
        assert!((payoff.pnl_at(160.0).unwrap() - 1000.0).abs() < 1e-9);
        assert!((payoff.pnl_at(140.0).unwrap() + 1000.0).abs() < 1e-9);
    }

    #[test]
    fn horizon_is_nearest_option_expiry() {
        let s = Strategy::builder("SPY", StrategyType::CalendarSpread)
            .leg(Leg::option(OptionType::Call, dec!(100), 30, dec!(-1), dec!(-250)))
            .leg(Leg::option(OptionType::Call, dec!(100), 60, dec!(1), dec!(360)))
            .build()
            .unwrap();
        assert_eq!(horizon_days(&s, 30), 30);

        let stock = Strategy::builder("AAPL", StrategyType::LongStock)
            .leg(Leg::stock(dec!(10), dec!(1500)))
            .build()
            .unwrap();
        assert_eq!(horizon_days(&stock, 45), 45);
    }
}
