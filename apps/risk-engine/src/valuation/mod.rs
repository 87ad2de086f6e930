//! Valuation analyzer.
//!
//! Prices a strategy directly with the Black-Scholes kernel, independent of
//! the risk pipeline: theoretical value, expected value against the premium,
//! breakeven price(s) and probability of profit.
//!
//! # Example
//!
//! ```ignore
//! use risk_engine::valuation::{ValuationAnalyzer, ValuationInputs};
//!
//! let analyzer = ValuationAnalyzer::default();
//! let report = analyzer.analyze(&strategy, &ValuationInputs::new(dec!(100)))?;
//! println!("{} breakevens: {:?}", report.ticker, report.breakevens);
//! ```

mod breakeven;
mod payoff;
mod probability;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{EngineConfig, PricingConfig, ValuationConfig};
use crate::models::{ModelError, Portfolio, Strategy};
use crate::observability;
use crate::pricing::{PricingError, to_decimal, to_f64};

pub use breakeven::BreakevenMethod;
pub use probability::{COMPLEX_PROBABILITY, ProfitRegion};

use breakeven::{analytic_breakevens, scan_breakevens, verify};
use payoff::{PayoffModel, horizon_days};
use probability::{Terminal, classify, probability_of_profit};

/// Errors from valuation.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Strategy has no legs to value.
    #[error("Strategy {ticker} has no legs")]
    EmptyStrategy {
        /// Underlying ticker.
        ticker: String,
    },

    /// Spot price is not usable.
    #[error("Invalid spot for {ticker}: {spot}")]
    InvalidSpot {
        /// Underlying ticker.
        ticker: String,
        /// Offending spot.
        spot: Decimal,
    },

    /// No market inputs supplied for the ticker.
    #[error("No valuation inputs for {ticker}")]
    MissingInputs {
        /// Underlying ticker.
        ticker: String,
    },

    /// Strategy failed validation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Pricing kernel rejected an input.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Market inputs for valuing one underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// Current underlying price.
    pub spot: Decimal,
    /// Volatility for legs without an implied volatility of their own.
    #[serde(default)]
    pub volatility: Option<Decimal>,
}

impl ValuationInputs {
    /// Inputs with a spot price and no volatility override.
    #[must_use]
    pub const fn new(spot: Decimal) -> Self {
        Self {
            spot,
            volatility: None,
        }
    }

    /// Set the fallback volatility.
    #[must_use]
    pub const fn with_volatility(mut self, volatility: Decimal) -> Self {
        self.volatility = Some(volatility);
        self
    }
}

/// Valuation of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    /// Underlying ticker.
    pub ticker: String,
    /// Σ kernel price × signed size × multiplier, today.
    pub theoretical_value: Decimal,
    /// Theoretical value minus the premium.
    pub expected_value: Decimal,
    /// Breakeven underlying prices at the nearest expiry, ascending.
    pub breakevens: Vec<Decimal>,
    /// How the breakevens were found.
    pub breakeven_method: BreakevenMethod,
    /// Profitable region at the nearest expiry.
    pub profit_region: ProfitRegion,
    /// Risk-neutral probability of finishing in the profitable region.
    pub probability_of_profit: Decimal,
}

/// A strategy that could not be valued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationFailure {
    /// Position of the strategy in the portfolio.
    pub index: usize,
    /// Underlying ticker.
    pub ticker: String,
    /// Error message.
    pub reason: String,
}

/// Valuation of every strategy in a portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    /// Successful reports in portfolio order.
    pub reports: Vec<ValuationReport>,
    /// Strategies that failed, isolated from the rest.
    pub failures: Vec<ValuationFailure>,
}

/// Theoretical value, breakeven and probability-of-profit analysis.
#[derive(Debug, Clone, Default)]
pub struct ValuationAnalyzer {
    pricing: PricingConfig,
    valuation: ValuationConfig,
}

impl ValuationAnalyzer {
    /// Create an analyzer.
    #[must_use]
    pub const fn new(pricing: PricingConfig, valuation: ValuationConfig) -> Self {
        Self { pricing, valuation }
    }

    /// Create an analyzer from the engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.pricing.clone(), config.valuation.clone())
    }

    /// Value one strategy.
    ///
    /// # Errors
    ///
    /// Returns `ValuationError` for an empty or invalid strategy, a
    /// non-positive spot, or kernel inputs the pricer rejects.
    pub fn analyze(
        &self,
        strategy: &Strategy,
        inputs: &ValuationInputs,
    ) -> Result<ValuationReport, ValuationError> {
        let result = self.evaluate(strategy, inputs);
        observability::record_valuation(result.is_ok());
        result
    }

    /// Value every strategy. Failures are collected per strategy and never
    /// stop the rest of the portfolio.
    #[must_use]
    pub fn analyze_portfolio(
        &self,
        portfolio: &Portfolio,
        inputs: &HashMap<String, ValuationInputs>,
    ) -> PortfolioValuation {
        let mut valuation = PortfolioValuation::default();
        for (index, strategy) in portfolio.strategies.iter().enumerate() {
            let outcome = inputs
                .get(&strategy.ticker)
                .ok_or_else(|| ValuationError::MissingInputs {
                    ticker: strategy.ticker.clone(),
                })
                .and_then(|i| self.analyze(strategy, i));

            match outcome {
                Ok(report) => valuation.reports.push(report),
                Err(e) => {
                    warn!(ticker = %strategy.ticker, index, error = %e, "Valuation failed");
                    valuation.failures.push(ValuationFailure {
                        index,
                        ticker: strategy.ticker.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        valuation
    }

    fn evaluate(
        &self,
        strategy: &Strategy,
        inputs: &ValuationInputs,
    ) -> Result<ValuationReport, ValuationError> {
        strategy.validate()?;
        if strategy.is_empty() {
            return Err(ValuationError::EmptyStrategy {
                ticker: strategy.ticker.clone(),
            });
        }
        if inputs.spot <= Decimal::ZERO {
            return Err(ValuationError::InvalidSpot {
                ticker: strategy.ticker.clone(),
                spot: inputs.spot,
            });
        }

        let spot = to_f64(inputs.spot);
        let volatility = self.strategy_volatility(strategy, inputs);

        let today = PayoffModel::new(strategy, 0, volatility, &self.pricing)?;
        let theoretical_value = today.value_at(spot)?;

        let horizon = horizon_days(strategy, self.valuation.stock_horizon_days);
        let at_horizon = PayoffModel::new(strategy, horizon, volatility, &self.pricing)?;

        let (breakevens, method) = self.breakevens(strategy, &at_horizon, spot)?;
        let profit_floor =
            self.valuation.breakeven_tolerance * at_horizon.premium().abs().max(1.0);
        let region = classify(&breakevens, profit_floor, |x| at_horizon.pnl_at(x))?;
        let terminal = Terminal {
            spot,
            years: self.pricing.years(horizon),
            rate: self.pricing.risk_free_rate,
            dividend_yield: self.pricing.dividend_yield,
            volatility,
        };
        let pop = probability_of_profit(region, &breakevens, &terminal);

        debug!(
            ticker = %strategy.ticker,
            ?method,
            ?region,
            breakevens = breakevens.len(),
            "Strategy valued"
        );

        Ok(ValuationReport {
            ticker: strategy.ticker.clone(),
            theoretical_value: to_decimal(theoretical_value),
            expected_value: to_decimal(theoretical_value - today.premium()),
            breakevens: breakevens.into_iter().map(to_decimal).collect(),
            breakeven_method: method,
            profit_region: region,
            probability_of_profit: to_decimal(pop),
        })
    }

    fn breakevens(
        &self,
        strategy: &Strategy,
        payoff: &PayoffModel,
        spot: f64,
    ) -> Result<(Vec<f64>, BreakevenMethod), PricingError> {
        if let Some(points) = analytic_breakevens(strategy) {
            if verify(payoff, &points, self.valuation.breakeven_tolerance)? {
                return Ok((points, BreakevenMethod::Analytic));
            }
            debug!(ticker = %strategy.ticker, "Analytic breakevens rejected, scanning");
        }
        let points = scan_breakevens(payoff, spot, &self.valuation)?;
        Ok((points, BreakevenMethod::NumericScan))
    }

    /// Volatility for the terminal distribution and for legs without
    /// their own: the caller's override, else the mean leg IV, else the
    /// configured default.
    fn strategy_volatility(&self, strategy: &Strategy, inputs: &ValuationInputs) -> f64 {
        if let Some(v) = inputs.volatility.filter(|v| *v > Decimal::ZERO) {
            return to_f64(v);
        }
        let ivs: Vec<Decimal> = strategy
            .option_legs()
            .filter_map(|l| l.implied_volatility)
            .collect();
        if ivs.is_empty() {
            self.pricing.default_volatility
        } else {
            let count = Decimal::from(ivs.len());
            to_f64(ivs.iter().copied().sum::<Decimal>() / count)
        }
    }
}
