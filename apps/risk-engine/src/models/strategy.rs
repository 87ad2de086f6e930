//! Strategies: the unit the engine computes risk for.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::errors::{ModelError, within_input_range};
use super::greeks::Greeks;
use super::leg::Leg;
use super::risk_profile::{ExpectedDailyMove, RiskCategory, RiskProfile};

/// Type of options strategy.
///
/// Every type-specific default is driven off this tag; the free-text
/// description is never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Long call.
    LongCall,
    /// Long put.
    LongPut,
    /// Naked short call.
    ShortCall,
    /// Naked short put.
    ShortPut,
    /// Long stock plus short call.
    CoveredCall,
    /// Short put backed by cash.
    CashSecuredPut,
    /// Bull Call Spread (bullish, debit).
    BullCallSpread,
    /// Bear Call Spread (bearish, credit).
    BearCallSpread,
    /// Bull Put Spread (bullish, credit).
    BullPutSpread,
    /// Bear Put Spread (bearish, debit).
    BearPutSpread,
    /// Iron Condor (neutral).
    IronCondor,
    /// Iron Butterfly (neutral).
    IronButterfly,
    /// Call Butterfly.
    CallButterfly,
    /// Put Butterfly.
    PutButterfly,
    /// Long straddle (long volatility).
    LongStraddle,
    /// Short straddle (short volatility).
    ShortStraddle,
    /// Long strangle (long volatility).
    LongStrangle,
    /// Short strangle (short volatility).
    ShortStrangle,
    /// Calendar Spread (same strike, different expirations).
    CalendarSpread,
    /// Diagonal Spread (different strikes and expirations).
    DiagonalSpread,
    /// Long shares.
    LongStock,
    /// Short shares.
    ShortStock,
    /// Any other combination of legs.
    Custom,
}

impl StrategyType {
    /// Risk category implied by the structure.
    #[must_use]
    pub const fn default_risk_category(self) -> RiskCategory {
        match self {
            Self::LongCall
            | Self::LongPut
            | Self::BullCallSpread
            | Self::BearCallSpread
            | Self::BullPutSpread
            | Self::BearPutSpread
            | Self::IronCondor
            | Self::IronButterfly
            | Self::CallButterfly
            | Self::PutButterfly
            | Self::LongStraddle
            | Self::LongStrangle
            | Self::CalendarSpread
            | Self::DiagonalSpread => RiskCategory::Defined,
            Self::ShortCall
            | Self::ShortPut
            | Self::CoveredCall
            | Self::CashSecuredPut
            | Self::ShortStraddle
            | Self::ShortStrangle
            | Self::LongStock
            | Self::ShortStock
            | Self::Custom => RiskCategory::Undefined,
        }
    }

    /// Directional bias implied by the structure.
    #[must_use]
    pub const fn default_direction(self) -> DirectionalAssumption {
        match self {
            Self::LongCall
            | Self::ShortPut
            | Self::CoveredCall
            | Self::CashSecuredPut
            | Self::BullCallSpread
            | Self::BullPutSpread
            | Self::LongStock => DirectionalAssumption::Bullish,
            Self::LongPut
            | Self::ShortCall
            | Self::BearCallSpread
            | Self::BearPutSpread
            | Self::ShortStock => DirectionalAssumption::Bearish,
            _ => DirectionalAssumption::Neutral,
        }
    }

    /// Volatility bias implied by the structure.
    #[must_use]
    pub const fn default_volatility(self) -> VolatilityAssumption {
        match self {
            Self::LongCall
            | Self::LongPut
            | Self::LongStraddle
            | Self::LongStrangle
            | Self::CalendarSpread
            | Self::DiagonalSpread => VolatilityAssumption::Long,
            Self::ShortCall
            | Self::ShortPut
            | Self::CashSecuredPut
            | Self::CoveredCall
            | Self::IronCondor
            | Self::IronButterfly
            | Self::ShortStraddle
            | Self::ShortStrangle
            | Self::BearCallSpread
            | Self::BullPutSpread => VolatilityAssumption::Short,
            _ => VolatilityAssumption::Neutral,
        }
    }
}

/// Directional assumption of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionalAssumption {
    /// Profits from a rising underlying.
    Bullish,
    /// Profits from a falling underlying.
    Bearish,
    /// Profits from a range-bound underlying.
    #[default]
    Neutral,
}

impl DirectionalAssumption {
    /// Whether the strategy takes a directional view.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        matches!(self, Self::Bullish | Self::Bearish)
    }
}

/// Volatility assumption of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityAssumption {
    /// Profits from rising volatility.
    Long,
    /// Profits from falling volatility.
    Short,
    /// No volatility view.
    #[default]
    Neutral,
}

/// Asset class of the underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Single-name equity.
    #[default]
    Equity,
    /// Exchange-traded fund.
    Etf,
    /// Cash-settled index.
    Index,
    /// Futures.
    Future,
    /// Anything else.
    #[serde(other)]
    Other,
}

/// A multi-leg position plus the risk outputs the engine writes onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Underlying ticker.
    pub ticker: String,
    /// Asset class of the underlying.
    #[serde(default)]
    pub asset_class: AssetClass,
    /// Display-only description.
    #[serde(default)]
    pub description: String,
    /// Structural tag.
    pub strategy_type: StrategyType,
    /// Beta to the benchmark.
    #[serde(default = "default_beta")]
    pub beta: Decimal,
    /// Signed net premium (positive = debit paid, negative = credit received).
    pub premium: Decimal,
    /// Legs in entry order.
    #[serde(default)]
    pub legs: Vec<Leg>,
    /// Aggregated position Greeks.
    #[serde(default)]
    pub greeks: Greeks,
    /// Expected one-day move decomposition.
    #[serde(default)]
    pub expected_move: ExpectedDailyMove,
    /// Risk outputs.
    pub risk: RiskProfile,
    /// Current unrealised P&L.
    #[serde(default)]
    pub current_pnl: Decimal,
    /// P&L as a percentage of |premium|.
    #[serde(default)]
    pub pnl_pct: Decimal,
    /// Directional view.
    #[serde(default)]
    pub directional_assumption: DirectionalAssumption,
    /// Volatility view.
    #[serde(default)]
    pub volatility_assumption: VolatilityAssumption,
}

const fn default_beta() -> Decimal {
    Decimal::ONE
}

impl Strategy {
    /// Start building a strategy.
    #[must_use]
    pub fn builder(ticker: impl Into<String>, strategy_type: StrategyType) -> StrategyBuilder {
        StrategyBuilder::new(ticker, strategy_type)
    }

    /// Validate the strategy and all of its legs.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for an empty ticker, an implausible beta, an
    /// out-of-range premium or P&L, or the first invalid leg.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.ticker.trim().is_empty() {
            return Err(ModelError::EmptyTicker);
        }
        if self.beta.abs() > dec!(10) {
            return Err(ModelError::InvalidBeta { beta: self.beta });
        }
        for (idx, leg) in self.legs.iter().enumerate() {
            leg.validate(idx)?;
        }
        for (field, value) in [("premium", self.premium), ("current_pnl", self.current_pnl)] {
            if !within_input_range(value) {
                return Err(ModelError::OutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Whether the strategy has no legs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Sum of leg cost bases.
    #[must_use]
    pub fn leg_cost_basis(&self) -> Decimal {
        sum_cost_basis(&self.legs)
    }

    /// Option legs only.
    pub fn option_legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter().filter(|l| l.is_option())
    }

    /// Zero every computed output (Greeks, exposures, risk, P&L %).
    pub fn reset_outputs(&mut self) {
        self.greeks = Greeks::ZERO;
        self.expected_move = ExpectedDailyMove::default();
        self.risk.reset();
        self.pnl_pct = Decimal::ZERO;
    }

    /// P&L as a percentage of |premium|, zero when premium is zero.
    ///
    /// `None` when a near-zero premium pushes the ratio out of range.
    #[must_use]
    pub fn compute_pnl_pct(&self) -> Option<Decimal> {
        let basis = self.premium.abs();
        if basis.is_zero() {
            Some(Decimal::ZERO)
        } else {
            self.current_pnl
                .checked_div(basis)?
                .checked_mul(Decimal::ONE_HUNDRED)
        }
    }
}

/// Saturates instead of overflowing; validation rejects the saturated total.
fn sum_cost_basis(legs: &[Leg]) -> Decimal {
    legs.iter()
        .fold(Decimal::ZERO, |acc, l| acc.saturating_add(l.cost_basis))
}

/// Builder that produces a validated [`Strategy`].
#[derive(Debug, Clone)]
pub struct StrategyBuilder {
    ticker: String,
    strategy_type: StrategyType,
    asset_class: AssetClass,
    description: String,
    beta: Decimal,
    premium: Option<Decimal>,
    legs: Vec<Leg>,
    risk_category: Option<RiskCategory>,
    direction: Option<DirectionalAssumption>,
    volatility: Option<VolatilityAssumption>,
    current_pnl: Decimal,
}

impl StrategyBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(ticker: impl Into<String>, strategy_type: StrategyType) -> Self {
        Self {
            ticker: ticker.into(),
            strategy_type,
            asset_class: AssetClass::default(),
            description: String::new(),
            beta: Decimal::ONE,
            premium: None,
            legs: Vec::new(),
            risk_category: None,
            direction: None,
            volatility: None,
            current_pnl: Decimal::ZERO,
        }
    }

    /// Set the asset class.
    #[must_use]
    pub const fn asset_class(mut self, asset_class: AssetClass) -> Self {
        self.asset_class = asset_class;
        self
    }

    /// Set the display description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set beta to the benchmark.
    #[must_use]
    pub const fn beta(mut self, beta: Decimal) -> Self {
        self.beta = beta;
        self
    }

    /// Override the net premium (defaults to the sum of leg cost bases).
    #[must_use]
    pub const fn premium(mut self, premium: Decimal) -> Self {
        self.premium = Some(premium);
        self
    }

    /// Append a leg.
    #[must_use]
    pub fn leg(mut self, leg: Leg) -> Self {
        self.legs.push(leg);
        self
    }

    /// Override the risk category implied by the strategy type.
    #[must_use]
    pub const fn risk_category(mut self, category: RiskCategory) -> Self {
        self.risk_category = Some(category);
        self
    }

    /// Override the directional assumption implied by the strategy type.
    #[must_use]
    pub const fn direction(mut self, direction: DirectionalAssumption) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Override the volatility assumption implied by the strategy type.
    #[must_use]
    pub const fn volatility(mut self, volatility: VolatilityAssumption) -> Self {
        self.volatility = Some(volatility);
        self
    }

    /// Set the current unrealised P&L.
    #[must_use]
    pub const fn current_pnl(mut self, pnl: Decimal) -> Self {
        self.current_pnl = pnl;
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<Strategy, ModelError> {
        let premium = self
            .premium
            .unwrap_or_else(|| sum_cost_basis(&self.legs));
        let category = self
            .risk_category
            .unwrap_or_else(|| self.strategy_type.default_risk_category());

        let strategy = Strategy {
            ticker: self.ticker,
            asset_class: self.asset_class,
            description: self.description,
            strategy_type: self.strategy_type,
            beta: self.beta,
            premium,
            legs: self.legs,
            greeks: Greeks::ZERO,
            expected_move: ExpectedDailyMove::default(),
            risk: RiskProfile::new(category),
            current_pnl: self.current_pnl,
            pnl_pct: Decimal::ZERO,
            directional_assumption: self
                .direction
                .unwrap_or_else(|| self.strategy_type.default_direction()),
            volatility_assumption: self
                .volatility
                .unwrap_or_else(|| self.strategy_type.default_volatility()),
        };

        strategy.validate()?;
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionType;

    fn iron_condor() -> Strategy {
        Strategy::builder("SPY", StrategyType::IronCondor)
            .description("Iron Condor 440/445/465/470")
            .leg(Leg::option(OptionType::Put, dec!(440), 30, dec!(1), dec!(80)))
            .leg(Leg::option(OptionType::Put, dec!(445), 30, dec!(-1), dec!(-150)))
            .leg(Leg::option(OptionType::Call, dec!(465), 30, dec!(-1), dec!(-140)))
            .leg(Leg::option(OptionType::Call, dec!(470), 30, dec!(1), dec!(70)))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_sums_premium_from_legs() {
        let s = iron_condor();
        assert_eq!(s.premium, dec!(-140));
        assert_eq!(s.leg_cost_basis(), dec!(-140));
        assert_eq!(s.option_legs().count(), 4);
    }

    #[test]
    fn builder_defaults_follow_strategy_type() {
        let s = iron_condor();
        assert_eq!(s.risk.risk_category, RiskCategory::Defined);
        assert_eq!(s.directional_assumption, DirectionalAssumption::Neutral);
        assert_eq!(s.volatility_assumption, VolatilityAssumption::Short);
    }

    #[test]
    fn description_never_drives_defaults() {
        // Text says iron condor, tag says short strangle: the tag wins.
        let s = Strategy::builder("SPY", StrategyType::ShortStrangle)
            .description("Iron Condor")
            .build()
            .unwrap();
        assert_eq!(s.risk.risk_category, RiskCategory::Undefined);
    }

    #[test]
    fn builder_overrides() {
        let s = Strategy::builder("AAPL", StrategyType::Custom)
            .premium(dec!(-1500))
            .risk_category(RiskCategory::Defined)
            .direction(DirectionalAssumption::Bearish)
            .beta(dec!(1.2))
            .build()
            .unwrap();
        assert_eq!(s.premium, dec!(-1500));
        assert_eq!(s.risk.risk_category, RiskCategory::Defined);
        assert!(s.directional_assumption.is_directional());
        assert_eq!(s.beta, dec!(1.2));
    }

    #[test]
    fn builder_rejects_invalid_input() {
        assert_eq!(
            Strategy::builder("  ", StrategyType::LongCall).build(),
            Err(ModelError::EmptyTicker)
        );
        assert!(matches!(
            Strategy::builder("TSLA", StrategyType::LongCall)
                .beta(dec!(25))
                .build(),
            Err(ModelError::InvalidBeta { .. })
        ));
    }

    #[test]
    fn builder_rejects_oversized_amounts() {
        let overflowing_legs = Strategy::builder("XYZ", StrategyType::Custom)
            .leg(Leg::stock(dec!(1), Decimal::MAX))
            .leg(Leg::stock(dec!(1), Decimal::MAX))
            .build();
        assert!(matches!(
            overflowing_legs,
            Err(ModelError::LegOutOfRange { leg_index: 0, field: "cost_basis", .. })
        ));

        let huge_pnl = Strategy::builder("XYZ", StrategyType::LongStock)
            .leg(Leg::stock(dec!(100), dec!(6000)))
            .current_pnl(Decimal::MIN)
            .build();
        assert!(matches!(
            huge_pnl,
            Err(ModelError::OutOfRange { field: "current_pnl", .. })
        ));
    }

    #[test]
    fn pnl_pct_guards_zero_premium() {
        let mut s = iron_condor();
        s.current_pnl = dec!(70);
        assert_eq!(s.compute_pnl_pct(), Some(dec!(50)));

        s.premium = Decimal::ZERO;
        assert_eq!(s.compute_pnl_pct(), Some(Decimal::ZERO));

        s.premium = Decimal::new(1, 28);
        s.current_pnl = dec!(1000000);
        assert_eq!(s.compute_pnl_pct(), None);
    }

    #[test]
    fn strategy_roundtrips_through_json() {
        let s = iron_condor();
        let json = serde_json::to_string(&s).unwrap();
        let parsed: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
