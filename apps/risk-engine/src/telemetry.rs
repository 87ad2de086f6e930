//! Structured logging setup.
//!
//! Installs a `tracing` subscriber driven by [`LoggingConfig`].
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives; overrides `logging.level` when set
//! - `logging.format`: `json` for machine-readable lines, `pretty` for a
//!   human-readable console
//! - `logging.include_spans`: attach the span context (`portfolio_metrics`,
//!   `strategy_pass`, `leg_refresh`) to each event
//!
//! # Usage
//!
//! ```rust,ignore
//! use risk_engine::config::load_config;
//! use risk_engine::telemetry::init_tracing;
//!
//! let config = load_config(None)?;
//! init_tracing(&config.observability.logging)?;
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Errors from subscriber installation.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Build the filter: `RUST_LOG` wins, then the configured level.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` when neither source parses.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
            filter: config.level.clone(),
            message: e.to_string(),
        })
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    let result = if config.format == "pretty" {
        let span_events = if config.include_spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_span_events(span_events)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(config.include_spans)
            .with_span_list(config.include_spans)
            .try_init()
    };

    result.map_err(|e| TelemetryError::Install(e.to_string()))?;
    tracing::debug!(format = %config.format, level = %config.level, "Tracing initialized");
    Ok(())
}
