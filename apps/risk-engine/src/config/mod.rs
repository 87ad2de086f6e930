//! Configuration module for the risk engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for the estimators, the valuation analyzer and the pipeline.
//!
//! # Usage
//!
//! ```rust,ignore
//! use risk_engine::config::{EngineConfig, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Every section has defaults; an empty document is valid
//! let config = EngineConfig::default();
//! println!("diversification: {}", config.risk.diversification_factor);
//! ```

mod observability;
mod pricing;
mod risk;
mod valuation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LoggingConfig, MetricsConfig, ObservabilityConfig};
pub use pricing::PricingConfig;
pub use risk::{RiskConfig, SurvivalConfig};
pub use valuation::{PipelineConfig, ValuationConfig};

/// Portfolio CVaR discount bounds.
const DIVERSIFICATION_RANGE: (f64, f64) = (0.80, 0.85);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pricing kernel parameters.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Margin, exposure and tail-risk parameters.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Survival table adjustments.
    #[serde(default)]
    pub survival: SurvivalConfig,
    /// Valuation analyzer settings.
    #[serde(default)]
    pub valuation: ValuationConfig,
    /// Pipeline execution settings.
    #[serde(default)]
    pub engine: PipelineConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<EngineConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: EngineConfig = if interpolated.trim().is_empty() {
        EngineConfig::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` naming the first out-of-range key.
pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    let pricing = &config.pricing;
    check_range("pricing.risk_free_rate", pricing.risk_free_rate, 0.0, 1.0)?;
    check_range("pricing.dividend_yield", pricing.dividend_yield, 0.0, 1.0)?;
    check_positive("pricing.days_per_year", pricing.days_per_year)?;
    check_positive("pricing.default_volatility", pricing.default_volatility)?;
    check_positive("pricing.iv_solver.tolerance", pricing.iv_solver.tolerance)?;
    if pricing.iv_solver.min_vol <= 0.0 || pricing.iv_solver.min_vol >= pricing.iv_solver.max_vol {
        return Err(ConfigError::ValidationError(
            "pricing.iv_solver requires 0 < min_vol < max_vol".to_string(),
        ));
    }

    let risk = &config.risk;
    let (low, high) = DIVERSIFICATION_RANGE;
    check_range(
        "risk.diversification_factor",
        risk.diversification_factor,
        low,
        high,
    )?;
    check_positive("risk.stress_sigma", risk.stress_sigma)?;
    check_range("risk.defined_cvar_factor", risk.defined_cvar_factor, 0.0, 1.0)?;
    check_positive(
        "risk.undefined_margin_multiplier",
        risk.undefined_margin_multiplier,
    )?;
    check_positive("risk.vix_reference", risk.vix_reference)?;
    check_positive("risk.trading_days_per_year", risk.trading_days_per_year)?;

    let survival = &config.survival;
    check_range("survival.theta_p10_tilt", survival.theta_p10_tilt, 0.0, 0.25)?;
    check_range("survival.theta_p25_tilt", survival.theta_p25_tilt, 0.0, 0.25)?;
    check_range("survival.gamma_p50_tilt", survival.gamma_p50_tilt, 0.0, 0.25)?;

    let valuation = &config.valuation;
    if valuation.grid_points < 3 {
        return Err(ConfigError::ValidationError(
            "valuation.grid_points must be at least 3".to_string(),
        ));
    }
    if !(valuation.grid_lower > 0.0 && valuation.grid_lower < 1.0 && valuation.grid_upper > 1.0) {
        return Err(ConfigError::ValidationError(
            "valuation grid must satisfy 0 < grid_lower < 1 < grid_upper".to_string(),
        ));
    }
    check_positive("valuation.breakeven_tolerance", valuation.breakeven_tolerance)?;

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    let metrics = &config.observability.metrics;
    for (name, buckets) in [
        ("observability.metrics.latency_buckets", &metrics.latency_buckets),
        ("observability.metrics.iteration_buckets", &metrics.iteration_buckets),
    ] {
        if buckets.is_empty() || buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be non-empty and strictly increasing"
            )));
        }
    }

    Ok(())
}

fn check_range(name: &str, value: f64, low: f64, high: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (low..=high).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be between {low} and {high}, got {value}"
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be positive, got {value}"
        )))
    }
}
