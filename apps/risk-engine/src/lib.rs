// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::items_after_statements
    )
)]

//! Risk Engine - Rust Core Library
//!
//! Portfolio risk and valuation engine for multi-leg options strategies.
//!
//! # Layout
//!
//! - `models`: Legs, strategies, portfolio snapshot and market inputs
//! - `pricing`: Black-Scholes kernel and implied volatility solver
//! - `risk`: Greeks aggregation, margin, exposures, CVaR/MCR, survival
//! - `engine`: The per-cycle portfolio metrics pipeline and diagnostics
//! - `valuation`: Theoretical value, breakevens and probability of profit
//! - `market_data`: Async port and leg Greeks refresh ahead of a run
//! - `config`: YAML configuration with `${VAR}` interpolation
//! - `observability` / `telemetry`: Prometheus metrics and structured logs
//!
//! # Refresh cycle
//!
//! ```ignore
//! use risk_engine::{PortfolioMetricsEngine, config::load_config};
//!
//! let config = load_config(None)?;
//! let engine = PortfolioMetricsEngine::new(config)?;
//! let report = engine.run(&mut portfolio, &market);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Configuration loading and validation.
pub mod config;

/// Portfolio metrics pipeline.
pub mod engine;

/// Crate-level error type and error codes.
pub mod error;

/// Market data port and leg Greeks refresh.
pub mod market_data;

/// Portfolio data model.
pub mod models;

/// Prometheus metrics.
pub mod observability;

/// Options pricing.
pub mod pricing;

/// Risk calculators.
pub mod risk;

/// Structured logging setup.
pub mod telemetry;

/// Strategy valuation.
pub mod valuation;

pub use config::{EngineConfig, load_config};
pub use engine::{Diagnostic, DiagnosticKind, PipelineReport, PortfolioMetricsEngine};
pub use error::{EngineError, ErrorCode};
pub use models::{
    Greeks, Leg, MarketConditions, Portfolio, RiskCategory, Strategy, StrategyType,
    SurvivalProbabilities,
};
pub use valuation::{ValuationAnalyzer, ValuationInputs, ValuationReport};
