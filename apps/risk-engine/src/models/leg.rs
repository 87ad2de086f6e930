//! Strategy legs.
//!
//! A leg is one tradable instrument inside a strategy. Size is signed
//! (positive = long, negative = short) and the cost basis is the signed
//! total paid for the leg (positive = debit paid, negative = credit received).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::errors::{ModelError, within_input_range};
use super::greeks::Greeks;

/// Instrument kind of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    /// Listed option.
    Option,
    /// Shares of the underlying.
    Stock,
}

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Call option (right to buy).
    Call,
    /// Put option (right to sell).
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "Call"),
            Self::Put => write!(f, "Put"),
        }
    }
}

/// One instrument within a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Instrument kind.
    pub kind: LegKind,
    /// Call/put for option legs, `None` for stock.
    #[serde(default)]
    pub option_type: Option<OptionType>,
    /// Strike for option legs.
    #[serde(default)]
    pub strike: Option<Decimal>,
    /// Expiration date, when known.
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    /// Calendar days until expiration (0 for stock or expired options).
    #[serde(default)]
    pub days_to_expiry: u32,
    /// Signed total cost (positive = debit paid, negative = credit received).
    pub cost_basis: Decimal,
    /// Signed position size in contracts/shares.
    pub position_size: Decimal,
    /// Contract multiplier (100 for equity options, 1 for shares).
    pub multiplier: Decimal,
    /// Per-contract Greeks; `None` until market data has been attached.
    #[serde(default)]
    pub greeks: Option<Greeks>,
    /// Implied volatility (annualised, e.g. 0.25) when known.
    #[serde(default)]
    pub implied_volatility: Option<Decimal>,
}

impl Leg {
    /// Create an option leg with the standard equity multiplier of 100.
    #[must_use]
    pub fn option(
        option_type: OptionType,
        strike: Decimal,
        days_to_expiry: u32,
        position_size: Decimal,
        cost_basis: Decimal,
    ) -> Self {
        Self {
            kind: LegKind::Option,
            option_type: Some(option_type),
            strike: Some(strike),
            expiry: None,
            days_to_expiry,
            cost_basis,
            position_size,
            multiplier: dec!(100),
            greeks: None,
            implied_volatility: None,
        }
    }

    /// Create a stock leg. Greeks default to delta 1 per share.
    #[must_use]
    pub fn stock(position_size: Decimal, cost_basis: Decimal) -> Self {
        Self {
            kind: LegKind::Stock,
            option_type: None,
            strike: None,
            expiry: None,
            days_to_expiry: 0,
            cost_basis,
            position_size,
            multiplier: Decimal::ONE,
            greeks: Some(Greeks::with_delta(Decimal::ONE)),
            implied_volatility: None,
        }
    }

    /// Attach per-contract Greeks.
    #[must_use]
    pub const fn with_greeks(mut self, greeks: Greeks) -> Self {
        self.greeks = Some(greeks);
        self
    }

    /// Set the expiration date.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Override the contract multiplier.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: Decimal) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Attach an implied volatility.
    #[must_use]
    pub const fn with_implied_volatility(mut self, volatility: Decimal) -> Self {
        self.implied_volatility = Some(volatility);
        self
    }

    /// Whether this is an option leg.
    #[must_use]
    pub fn is_option(&self) -> bool {
        self.kind == LegKind::Option
    }

    /// Whether the position is long.
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.position_size > Decimal::ZERO
    }

    /// Signed size × multiplier: the factor per-contract quantities scale by.
    #[must_use]
    pub fn exposure_factor(&self) -> Decimal {
        self.position_size * self.multiplier
    }

    /// Per-unit Greeks, if known. Stock always has delta 1.
    #[must_use]
    pub fn unit_greeks(&self) -> Option<Greeks> {
        match self.kind {
            LegKind::Stock => Some(
                self.greeks
                    .unwrap_or_else(|| Greeks::with_delta(Decimal::ONE)),
            ),
            LegKind::Option => self.greeks,
        }
    }

    /// Position-weighted Greeks (`greek × size × multiplier`).
    ///
    /// Missing option Greeks contribute zero.
    #[must_use]
    pub fn weighted_greeks(&self) -> Greeks {
        self.unit_greeks()
            .map_or(Greeks::ZERO, |g| g.scale(self.exposure_factor()))
    }

    /// [`weighted_greeks`](Self::weighted_greeks) that returns `None` on
    /// overflow.
    #[must_use]
    pub fn checked_weighted_greeks(&self) -> Option<Greeks> {
        match self.unit_greeks() {
            Some(g) => g.checked_scale(self.position_size.checked_mul(self.multiplier)?),
            None => Some(Greeks::ZERO),
        }
    }

    /// Premium per share/unit, unsigned.
    ///
    /// Returns zero for a zero-size leg.
    #[must_use]
    pub fn unit_premium(&self) -> Decimal {
        let units = self.exposure_factor().abs();
        if units.is_zero() {
            Decimal::ZERO
        } else {
            self.cost_basis.abs() / units
        }
    }

    /// Validate the leg. `leg_index` is used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found on the leg.
    pub fn validate(&self, leg_index: usize) -> Result<(), ModelError> {
        if self.multiplier <= Decimal::ZERO {
            return Err(ModelError::InvalidMultiplier {
                leg_index,
                multiplier: self.multiplier,
            });
        }

        match self.kind {
            LegKind::Option => {
                if self.option_type.is_none() {
                    return Err(ModelError::MissingOptionType { leg_index });
                }
                match self.strike {
                    Some(k) if k > Decimal::ZERO => {}
                    strike => return Err(ModelError::InvalidStrike { leg_index, strike }),
                }
            }
            LegKind::Stock => {
                if self.option_type.is_some() || self.strike.is_some() {
                    return Err(ModelError::StockWithOptionFields { leg_index });
                }
            }
        }

        if let Some(volatility) = self.implied_volatility {
            if volatility <= Decimal::ZERO {
                return Err(ModelError::InvalidVolatility {
                    leg_index,
                    volatility,
                });
            }
        }

        let greeks = self.greeks.unwrap_or_default();
        let magnitudes = [
            ("position_size", self.position_size),
            ("multiplier", self.multiplier),
            ("strike", self.strike.unwrap_or_default()),
            ("cost_basis", self.cost_basis),
            ("implied_volatility", self.implied_volatility.unwrap_or_default()),
            ("greeks", greeks.max_abs()),
        ];
        for (field, value) in magnitudes {
            if !within_input_range(value) {
                return Err(ModelError::LegOutOfRange {
                    leg_index,
                    field,
                    value,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_greeks_apply_sign_size_and_multiplier() {
        let leg = Leg::option(OptionType::Call, dec!(100), 30, dec!(-2), dec!(-500))
            .with_greeks(Greeks::new(dec!(0.4), dec!(0.02), dec!(-0.05), dec!(0.1)));

        let w = leg.weighted_greeks();
        assert_eq!(w.delta, dec!(-80));
        assert_eq!(w.gamma, dec!(-4));
        assert_eq!(w.theta, dec!(10));
        assert_eq!(w.vega, dec!(-20));
    }

    #[test]
    fn missing_greeks_contribute_zero() {
        let leg = Leg::option(OptionType::Put, dec!(95), 30, dec!(1), dec!(150));
        assert_eq!(leg.weighted_greeks(), Greeks::ZERO);
    }

    #[test]
    fn stock_leg_defaults_to_unit_delta() {
        let leg = Leg::stock(dec!(100), dec!(15000));
        assert_eq!(leg.weighted_greeks().delta, dec!(100));
        assert!(leg.validate(0).is_ok());

        let bare = Leg {
            greeks: None,
            ..Leg::stock(dec!(-50), dec!(-7500))
        };
        assert_eq!(bare.weighted_greeks().delta, dec!(-50));
    }

    #[test]
    fn unit_premium_per_share() {
        let leg = Leg::option(OptionType::Call, dec!(100), 30, dec!(2), dec!(500));
        assert_eq!(leg.unit_premium(), dec!(2.5));

        let empty = Leg::option(OptionType::Call, dec!(100), 30, Decimal::ZERO, dec!(500));
        assert_eq!(empty.unit_premium(), Decimal::ZERO);
    }

    #[test]
    fn validate_rejects_bad_legs() {
        let no_strike = Leg {
            strike: None,
            ..Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(100))
        };
        assert!(matches!(
            no_strike.validate(3),
            Err(ModelError::InvalidStrike { leg_index: 3, .. })
        ));

        let no_type = Leg {
            option_type: None,
            ..Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(100))
        };
        assert_eq!(
            no_type.validate(0),
            Err(ModelError::MissingOptionType { leg_index: 0 })
        );

        let zero_mult = Leg::stock(dec!(10), dec!(1000)).with_multiplier(Decimal::ZERO);
        assert!(matches!(
            zero_mult.validate(1),
            Err(ModelError::InvalidMultiplier { leg_index: 1, .. })
        ));

        let stock_with_strike = Leg {
            strike: Some(dec!(100)),
            ..Leg::stock(dec!(10), dec!(1000))
        };
        assert_eq!(
            stock_with_strike.validate(2),
            Err(ModelError::StockWithOptionFields { leg_index: 2 })
        );
    }

    #[test]
    fn validate_rejects_oversized_inputs() {
        use crate::models::MAX_INPUT_MAGNITUDE;

        let at_limit = Leg::stock(dec!(1), MAX_INPUT_MAGNITUDE);
        assert!(at_limit.validate(0).is_ok());

        let huge_cost = Leg::stock(dec!(1), Decimal::MAX / dec!(2));
        assert!(matches!(
            huge_cost.validate(1),
            Err(ModelError::LegOutOfRange { leg_index: 1, field: "cost_basis", .. })
        ));

        let theta = -MAX_INPUT_MAGNITUDE * dec!(2);
        let huge_greeks = Leg::option(OptionType::Call, dec!(100), 30, dec!(1), dec!(100))
            .with_greeks(Greeks::new(dec!(0.5), dec!(0.01), theta, dec!(0.1)));
        let Err(err) = huge_greeks.validate(2) else {
            panic!("expected out-of-range greeks");
        };
        assert!(err.to_string().starts_with("leg 2: greeks"));
    }

    #[test]
    fn leg_deserializes_canonical_shape() {
        let json = r#"{
            "kind": "option",
            "option_type": "put",
            "strike": "95",
            "days_to_expiry": 21,
            "cost_basis": "-120",
            "position_size": "-1",
            "multiplier": "100"
        }"#;
        let leg: Leg = serde_json::from_str(json).unwrap();
        assert_eq!(leg.option_type, Some(OptionType::Put));
        assert!(!leg.is_long());
        assert!(leg.greeks.is_none());
        assert!(leg.validate(0).is_ok());
    }
}
