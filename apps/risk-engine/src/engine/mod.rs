//! Portfolio metrics orchestrator.
//!
//! One [`PortfolioMetricsEngine::run`] call rewrites every computed field of
//! a [`Portfolio`] in four strictly ordered stages:
//!
//! 1. Market snapshot (expected one-day move, volatility change)
//! 2. Strategy pass: Greeks, margin, exposures, CVaR, survival, P&L %.
//!    Strategies are independent; large portfolios fan out on rayon with
//!    each worker writing only its own strategy.
//! 3. Portfolio pass: margin, beta-weighted Greeks, exposures, P&L
//! 4. Risk pass: diversified CVaR and MCR (needs stage 3 totals)
//!
//! The engine holds no state between runs; an unchanged snapshot always
//! produces identical outputs.

mod diagnostics;

use std::time::Instant;

use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{Level, Span, debug, info, span, warn};

use crate::config::{EngineConfig, PipelineConfig};
use crate::error::EngineError;
use crate::models::{MarketConditions, Portfolio, Strategy, SurvivalProbabilities};
use crate::observability;
use crate::risk::{
    MarginModel, MarketSnapshot, PremiumMarginModel, RiskError, SurvivalEstimator,
    TailRiskEstimator, aggregate_portfolio_greeks, aggregate_strategy_greeks, bounded,
    portfolio_exposure, strategy_exposure,
};

pub use diagnostics::{Diagnostic, DiagnosticKind, PipelineReport};

/// Runs the risk pipeline over a portfolio snapshot.
pub struct PortfolioMetricsEngine {
    config: EngineConfig,
    margin_model: Box<dyn MarginModel>,
    tail: TailRiskEstimator,
    survival: SurvivalEstimator,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for PortfolioMetricsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioMetricsEngine")
            .field("pipeline", &self.config.engine)
            .field("tail", &self.tail)
            .field("survival", &self.survival)
            .field("dedicated_pool", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for PortfolioMetricsEngine {
    fn default() -> Self {
        Self::with_pool(EngineConfig::default(), None)
    }
}

impl PortfolioMetricsEngine {
    /// Create an engine with the premium margin model.
    ///
    /// A dedicated worker pool is built when `engine.max_threads > 0`;
    /// otherwise the rayon global pool is used.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ThreadPool` if the worker pool cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let pool = match config.engine.max_threads {
            0 => None,
            threads => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("risk-engine-{i}"))
                    .build()?,
            ),
        };
        Ok(Self::with_pool(config, pool))
    }

    fn with_pool(config: EngineConfig, pool: Option<rayon::ThreadPool>) -> Self {
        Self {
            margin_model: Box::new(PremiumMarginModel::new(&config.risk)),
            tail: TailRiskEstimator::new(&config.risk),
            survival: SurvivalEstimator::new(&config.survival),
            config,
            pool,
        }
    }

    /// Replace the margin model.
    #[must_use]
    pub fn with_margin_model(mut self, model: impl MarginModel + 'static) -> Self {
        self.margin_model = Box::new(model);
        self
    }

    /// Pipeline execution settings.
    #[must_use]
    pub const fn pipeline(&self) -> &PipelineConfig {
        &self.config.engine
    }

    /// Run all four stages, rewriting the portfolio in place.
    pub fn run(&self, portfolio: &mut Portfolio, conditions: &MarketConditions) -> PipelineReport {
        let run_span = span!(
            Level::INFO,
            "portfolio_metrics",
            strategies = portfolio.strategies.len()
        );
        let _enter = run_span.enter();
        let start = Instant::now();

        // Stage 1
        let market = MarketSnapshot::from_conditions(conditions, &self.config.risk);
        debug!(
            expected_daily_move = %market.expected_daily_move,
            benchmark_move = %market.benchmark_move,
            vol_change = %market.vol_change,
            "Market snapshot"
        );

        // Stage 2
        let per_strategy = match &self.pool {
            Some(pool) => pool.install(|| self.strategy_stage(portfolio, &market, &run_span)),
            None => self.strategy_stage(portfolio, &market, &run_span),
        };

        let mut report = PipelineReport::default();
        for outcome in per_strategy {
            if outcome.failed {
                report.failed += 1;
            } else {
                report.processed += 1;
            }
            report.diagnostics.extend(outcome.diagnostics);
        }

        // Stage 3
        Self::portfolio_stage(portfolio);

        // Stage 4
        self.risk_stage(portfolio);

        for diagnostic in &report.diagnostics {
            warn!(
                ticker = %diagnostic.ticker,
                index = diagnostic.index,
                kind = %diagnostic.kind,
                detail = %diagnostic.detail,
                "Strategy diagnostic"
            );
            observability::record_diagnostic(diagnostic.kind);
        }

        let elapsed = start.elapsed();
        observability::record_pipeline_run(elapsed, report.processed, report.failed);
        info!(
            processed = report.processed,
            failed = report.failed,
            margin_used = %portfolio.margin_used,
            cvar = %portfolio.cvar,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Portfolio metrics updated"
        );

        report
    }

    fn strategy_stage(
        &self,
        portfolio: &mut Portfolio,
        market: &MarketSnapshot,
        parent: &Span,
    ) -> Vec<StrategyOutcome> {
        let strategies = &mut portfolio.strategies;
        if strategies.len() >= self.config.engine.parallel_threshold {
            strategies
                .par_iter_mut()
                .enumerate()
                .map(|(index, strategy)| self.strategy_pass(index, strategy, market, parent))
                .collect()
        } else {
            strategies
                .iter_mut()
                .enumerate()
                .map(|(index, strategy)| self.strategy_pass(index, strategy, market, parent))
                .collect()
        }
    }

    /// Compute every per-strategy output. Writes only to `strategy`.
    fn strategy_pass(
        &self,
        index: usize,
        strategy: &mut Strategy,
        market: &MarketSnapshot,
        parent: &Span,
    ) -> StrategyOutcome {
        let _span = span!(
            parent: parent,
            Level::DEBUG,
            "strategy_pass",
            ticker = %strategy.ticker,
            index
        )
        .entered();

        let ticker = strategy.ticker.clone();
        let diagnostic = |kind: DiagnosticKind, detail: String| Diagnostic {
            index,
            ticker: ticker.clone(),
            kind,
            detail,
        };

        if let Err(e) = strategy.validate() {
            strategy.reset_outputs();
            return StrategyOutcome::failed(diagnostic(
                DiagnosticKind::StrategyFailed,
                e.to_string(),
            ));
        }

        if strategy.is_empty() {
            strategy.reset_outputs();
            strategy.risk.survival = SurvivalProbabilities::ZERO;
            return StrategyOutcome::processed(vec![diagnostic(
                DiagnosticKind::EmptyStrategy,
                "strategy has no legs".to_string(),
            )]);
        }

        let missing_legs = match self.compute_outputs(strategy, market) {
            Ok(missing_legs) => missing_legs,
            Err(e) => {
                strategy.reset_outputs();
                return StrategyOutcome::failed(diagnostic(
                    DiagnosticKind::StrategyFailed,
                    e.to_string(),
                ));
            }
        };

        debug!(
            margin = %strategy.risk.margin,
            cvar = %strategy.risk.cvar,
            delta = %strategy.greeks.delta,
            "Strategy computed"
        );

        let mut diagnostics = Vec::new();
        if !missing_legs.is_empty() {
            diagnostics.push(diagnostic(
                DiagnosticKind::MissingLegGreeks,
                format!("legs {missing_legs:?} have no Greeks; counted as zero"),
            ));
        }
        StrategyOutcome::processed(diagnostics)
    }

    /// Write Greeks, margin, exposures, CVaR, survival and P&L % onto a
    /// validated, non-empty strategy. Returns the legs missing Greeks.
    ///
    /// Every output is checked against [`crate::risk::MAX_RISK_MAGNITUDE`] so the
    /// portfolio sums in stages 3 and 4 cannot overflow.
    fn compute_outputs(
        &self,
        strategy: &mut Strategy,
        market: &MarketSnapshot,
    ) -> Result<Vec<usize>, RiskError> {
        let totals = aggregate_strategy_greeks(&strategy.legs)?;
        strategy.greeks = totals.greeks;
        // Stage 3 beta-weights these; beta is validated to [-10, 10].
        bounded(strategy.greeks.max_abs(), "strategy greeks")?;

        let margin = self.margin_model.margin(strategy, market)?;
        strategy.risk.margin = bounded(margin.max(Decimal::ZERO), "margin")?;

        let exposure = strategy_exposure(
            &strategy.greeks,
            market.move_for_beta(strategy.beta),
            market.vol_change,
        )?;
        bounded(exposure.directional, "directional move")?;
        bounded(exposure.convexity, "convexity move")?;
        bounded(exposure.volatility, "volatility move")?;
        strategy.expected_move = exposure;
        strategy.risk.expected_delta_move = exposure.directional;
        strategy.risk.expected_convexity_move = exposure.convexity;

        strategy.risk.cvar = bounded(self.tail.strategy_cvar(strategy)?, "cvar")?;
        strategy.risk.mcr_pct = Decimal::ZERO;
        strategy.risk.survival = self.survival.estimate(
            strategy.risk.risk_category,
            strategy.directional_assumption,
            &strategy.greeks,
        );
        strategy.pnl_pct = strategy
            .compute_pnl_pct()
            .ok_or(RiskError::Overflow { quantity: "pnl percent" })?;

        Ok(totals.missing_legs)
    }

    fn portfolio_stage(portfolio: &mut Portfolio) {
        let greeks = aggregate_portfolio_greeks(&portfolio.strategies);
        portfolio.beta_weighted_delta = greeks.beta_weighted_delta;
        portfolio.beta_weighted_gamma = greeks.beta_weighted_gamma;
        portfolio.theta = greeks.theta;
        portfolio.vega = greeks.vega;
        portfolio.margin_used = portfolio.strategies.iter().map(|s| s.risk.margin).sum();
        portfolio.expected_move =
            portfolio_exposure(portfolio.strategies.iter().map(|s| s.expected_move));
        // Failed strategies keep their unvalidated P&L input.
        portfolio.pnl = portfolio
            .strategies
            .iter()
            .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.current_pnl));
    }

    fn risk_stage(&self, portfolio: &mut Portfolio) {
        let cvars: Vec<Decimal> = portfolio.strategies.iter().map(|s| s.risk.cvar).collect();
        let tail = self.tail.portfolio(&cvars);
        portfolio.cvar = tail.portfolio_cvar;
        for (strategy, mcr) in portfolio.strategies.iter_mut().zip(tail.mcr_pct) {
            strategy.risk.mcr_pct = mcr;
        }
    }
}

struct StrategyOutcome {
    diagnostics: Vec<Diagnostic>,
    failed: bool,
}

impl StrategyOutcome {
    const fn processed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            failed: false,
        }
    }

    fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            failed: true,
        }
    }
}
