//! Diagnostics channel for the metrics pipeline.
//!
//! Conditions that degrade a strategy's outputs without stopping the run.

use serde::{Deserialize, Serialize};

/// What went wrong for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Strategy has no legs; outputs are zero.
    EmptyStrategy,
    /// One or more option legs had no Greeks and contributed zero.
    MissingLegGreeks,
    /// Strategy failed validation; outputs were zeroed.
    StrategyFailed,
}

impl DiagnosticKind {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyStrategy => "empty_strategy",
            Self::MissingLegGreeks => "missing_leg_greeks",
            Self::StrategyFailed => "strategy_failed",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Position of the strategy in the portfolio.
    pub index: usize,
    /// Underlying ticker.
    pub ticker: String,
    /// Diagnostic kind.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub detail: String,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Diagnostics in strategy order.
    pub diagnostics: Vec<Diagnostic>,
    /// Strategies whose outputs were computed (including empty ones).
    pub processed: usize,
    /// Strategies zeroed because they failed validation.
    pub failed: usize,
}

impl PipelineReport {
    /// Whether the run produced no diagnostics.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}
