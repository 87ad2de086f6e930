//! Prometheus metrics for the risk engine.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `risk_pipeline_runs_total` | counter | |
//! | `risk_pipeline_seconds` | histogram | |
//! | `risk_pipeline_strategies` | gauge | `status` |
//! | `risk_strategy_diagnostics_total` | counter | `kind` |
//! | `valuation_reports_total` | counter | `status` |
//! | `iv_solver_iterations` | histogram | |
//!
//! # Example
//!
//! ```ignore
//! use risk_engine::config::MetricsConfig;
//! use risk_engine::observability::init_metrics;
//!
//! init_metrics(&MetricsConfig::default())?;
//! ```

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use crate::config::MetricsConfig;
use crate::engine::DiagnosticKind;

const PIPELINE_SECONDS: &str = "risk_pipeline_seconds";
const IV_ITERATIONS: &str = "iv_solver_iterations";

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Install the Prometheus exporter with an HTTP listener serving
/// `/metrics`.
///
/// # Errors
///
/// Returns an error if the buckets are rejected or the exporter fails to
/// start (e.g. port already in use, recorder already installed).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets_for_metric(
            Matcher::Full(PIPELINE_SECONDS.to_string()),
            &config.latency_buckets,
        )
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .set_buckets_for_metric(
            Matcher::Full(IV_ITERATIONS.to_string()),
            &config.iteration_buckets,
        )
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %config.listen_addr, "Prometheus metrics exporter started");

    Ok(())
}

/// Record one pipeline run.
///
/// # Arguments
///
/// * `elapsed` - Wall time of the run
/// * `processed` - Strategies whose outputs were computed
/// * `failed` - Strategies zeroed after failing validation
pub fn record_pipeline_run(elapsed: Duration, processed: usize, failed: usize) {
    counter!("risk_pipeline_runs_total").increment(1);
    histogram!(PIPELINE_SECONDS).record(elapsed);
    gauge!("risk_pipeline_strategies", "status" => "processed").set(processed as f64);
    gauge!("risk_pipeline_strategies", "status" => "failed").set(failed as f64);
}

/// Record one strategy diagnostic.
pub fn record_diagnostic(kind: DiagnosticKind) {
    counter!("risk_strategy_diagnostics_total", "kind" => kind.as_str()).increment(1);
}

/// Record a valuation attempt.
pub fn record_valuation(succeeded: bool) {
    let status = if succeeded { "ok" } else { "error" };
    counter!("valuation_reports_total", "status" => status).increment(1);
}

/// Record how many iterations the implied volatility solver needed.
pub fn record_iv_iterations(iterations: u32) {
    histogram!(IV_ITERATIONS).record(f64::from(iterations));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_pipeline_run(Duration::from_millis(3), 10, 1);
        record_diagnostic(DiagnosticKind::MissingLegGreeks);
        record_valuation(true);
        record_valuation(false);
        record_iv_iterations(7);
    }

    #[test]
    fn empty_buckets_are_rejected() {
        let config = MetricsConfig {
            latency_buckets: Vec::new(),
            ..MetricsConfig::default()
        };
        let Err(err) = init_metrics(&config) else {
            panic!("empty buckets should fail");
        };
        assert!(matches!(err, MetricsError::Configuration(_)));
    }
}
