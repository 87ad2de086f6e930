//! Pricing kernel parameters.

use serde::{Deserialize, Serialize};

use crate::pricing::IvSolverConfig;

/// Pricing model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Risk-free rate (annualized).
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Continuous dividend yield applied to every underlying.
    #[serde(default)]
    pub dividend_yield: f64,
    /// Days used to turn days-to-expiry into years.
    #[serde(default = "default_days_per_year")]
    pub days_per_year: f64,
    /// Volatility used when neither a leg nor the market-data provider
    /// supplies one.
    #[serde(default = "default_volatility")]
    pub default_volatility: f64,
    /// Implied-volatility solver settings.
    #[serde(default)]
    pub iv_solver: IvSolverConfig,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            dividend_yield: 0.0,
            days_per_year: default_days_per_year(),
            default_volatility: default_volatility(),
            iv_solver: IvSolverConfig::default(),
        }
    }
}

impl PricingConfig {
    /// Convert calendar days to a year fraction.
    #[must_use]
    pub fn years(&self, days: u32) -> f64 {
        f64::from(days) / self.days_per_year
    }
}

const fn default_risk_free_rate() -> f64 {
    0.05
}

const fn default_days_per_year() -> f64 {
    365.0
}

const fn default_volatility() -> f64 {
    0.20
}
