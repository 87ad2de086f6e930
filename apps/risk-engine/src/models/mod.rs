//! Portfolio data model.
//!
//! One canonical typed representation of legs, strategies and portfolios,
//! validated once at ingestion (via [`StrategyBuilder`] or
//! [`Strategy::validate`] after deserialisation).

mod errors;
mod greeks;
mod leg;
mod market;
mod portfolio;
mod risk_profile;
mod strategy;

pub use errors::{MAX_INPUT_MAGNITUDE, ModelError};
pub use greeks::Greeks;
pub use leg::{Leg, LegKind, OptionType};
pub use market::MarketConditions;
pub use portfolio::Portfolio;
pub use risk_profile::{ExpectedDailyMove, RiskCategory, RiskProfile, SurvivalProbabilities};
pub use strategy::{
    AssetClass, DirectionalAssumption, Strategy, StrategyBuilder, StrategyType,
    VolatilityAssumption,
};
