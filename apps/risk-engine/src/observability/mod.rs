//! Observability for the risk engine.
//!
//! Prometheus metrics for pipeline runs, diagnostics, valuations and the
//! implied volatility solver. Recording is a no-op until a recorder is
//! installed, so library callers that skip [`init_metrics`] pay nothing.

mod metrics;

pub use metrics::{
    MetricsError, init_metrics, record_diagnostic, record_iv_iterations, record_pipeline_run,
    record_valuation,
};
