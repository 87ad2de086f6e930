//! Risk estimator parameters: margin, tail risk, survival tilts.

use serde::{Deserialize, Serialize};

/// Margin, exposure and tail-risk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Portfolio CVaR discount standing in for a correlation model.
    #[serde(default = "default_diversification_factor")]
    pub diversification_factor: f64,
    /// Stress multiplier `k` applied to one-day exposures.
    #[serde(default = "default_stress_sigma")]
    pub stress_sigma: f64,
    /// Fraction of |premium| used as defined-risk CVaR.
    #[serde(default = "default_defined_cvar_factor")]
    pub defined_cvar_factor: f64,
    /// Premium multiple used as undefined-risk margin.
    #[serde(default = "default_undefined_margin_multiplier")]
    pub undefined_margin_multiplier: f64,
    /// VIX level at which undefined-risk margin doubles its base multiple.
    #[serde(default = "default_vix_reference")]
    pub vix_reference: f64,
    /// Trading days per year for annual-to-daily conversion.
    #[serde(default = "default_trading_days")]
    pub trading_days_per_year: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            diversification_factor: default_diversification_factor(),
            stress_sigma: default_stress_sigma(),
            defined_cvar_factor: default_defined_cvar_factor(),
            undefined_margin_multiplier: default_undefined_margin_multiplier(),
            vix_reference: default_vix_reference(),
            trading_days_per_year: default_trading_days(),
        }
    }
}

/// Adjustments applied on top of the survival table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalConfig {
    /// Added to P10 when the strategy collects theta.
    #[serde(default = "default_theta_p10_tilt")]
    pub theta_p10_tilt: f64,
    /// Added to P25 when the strategy collects theta.
    #[serde(default = "default_theta_p25_tilt")]
    pub theta_p25_tilt: f64,
    /// Subtracted from P50 for short gamma, added for long gamma.
    #[serde(default = "default_gamma_p50_tilt")]
    pub gamma_p50_tilt: f64,
}

impl Default for SurvivalConfig {
    fn default() -> Self {
        Self {
            theta_p10_tilt: default_theta_p10_tilt(),
            theta_p25_tilt: default_theta_p25_tilt(),
            gamma_p50_tilt: default_gamma_p50_tilt(),
        }
    }
}

const fn default_diversification_factor() -> f64 {
    0.85
}

const fn default_stress_sigma() -> f64 {
    3.0
}

const fn default_defined_cvar_factor() -> f64 {
    0.9
}

const fn default_undefined_margin_multiplier() -> f64 {
    1.5
}

const fn default_vix_reference() -> f64 {
    20.0
}

const fn default_trading_days() -> f64 {
    252.0
}

const fn default_theta_p10_tilt() -> f64 {
    0.03
}

const fn default_theta_p25_tilt() -> f64 {
    0.02
}

const fn default_gamma_p50_tilt() -> f64 {
    0.02
}
