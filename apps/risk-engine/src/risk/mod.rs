//! Risk estimators.
//!
//! Each estimator is a pure function of its inputs; the pipeline in
//! [`crate::engine`] sequences them:
//!
//! 1. [`MarketSnapshot`]: expected one-day move and volatility change
//! 2. [`aggregate_strategy_greeks`], [`MarginModel`], [`strategy_exposure`],
//!    [`TailRiskEstimator::strategy_cvar`], [`SurvivalEstimator`] per strategy
//! 3. [`aggregate_portfolio_greeks`], [`portfolio_exposure`] over strategies
//! 4. [`TailRiskEstimator::portfolio`] for diversified CVaR and MCR
//!
//! Per-strategy estimators use checked `Decimal` arithmetic and return
//! [`RiskError`] instead of panicking on overflow.

mod error;
mod exposure;
mod greeks;
mod margin;
mod market;
mod survival;
mod tail;

pub(crate) use error::bounded;
pub use error::{MAX_RISK_MAGNITUDE, RiskError};
pub use exposure::{portfolio_exposure, strategy_exposure};
pub use greeks::{
    PortfolioGreeks, StrategyGreeks, aggregate_portfolio_greeks, aggregate_strategy_greeks,
};
pub use margin::{MarginModel, PremiumMarginModel};
pub use market::{MarketSnapshot, expected_daily_move};
pub use survival::{SurvivalEstimator, base_probabilities};
pub use tail::{TailRisk, TailRiskEstimator};
