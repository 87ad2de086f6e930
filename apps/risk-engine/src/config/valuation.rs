//! Valuation analyzer and pipeline execution settings.

use serde::{Deserialize, Serialize};

/// Breakeven search and probability-of-profit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Samples in the numeric breakeven scan.
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
    /// Lower scan bound as a fraction of spot.
    #[serde(default = "default_grid_lower")]
    pub grid_lower: f64,
    /// Upper scan bound as a fraction of spot.
    #[serde(default = "default_grid_upper")]
    pub grid_upper: f64,
    /// Relative P&L tolerance an analytic breakeven must satisfy before it
    /// is accepted instead of the numeric scan.
    #[serde(default = "default_breakeven_tolerance")]
    pub breakeven_tolerance: f64,
    /// Horizon for stock-only strategies, in calendar days.
    #[serde(default = "default_stock_horizon_days")]
    pub stock_horizon_days: u32,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            grid_points: default_grid_points(),
            grid_lower: default_grid_lower(),
            grid_upper: default_grid_upper(),
            breakeven_tolerance: default_breakeven_tolerance(),
            stock_horizon_days: default_stock_horizon_days(),
        }
    }
}

/// How the per-strategy stage is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Strategy count at which the strategy pass fans out across threads.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// Worker threads for the strategy pass (0 = rayon global pool).
    #[serde(default)]
    pub max_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
            max_threads: 0,
        }
    }
}

const fn default_grid_points() -> usize {
    1001
}

const fn default_grid_lower() -> f64 {
    0.5
}

const fn default_grid_upper() -> f64 {
    1.5
}

const fn default_breakeven_tolerance() -> f64 {
    1e-6
}

const fn default_stock_horizon_days() -> u32 {
    30
}

const fn default_parallel_threshold() -> usize {
    16
}
