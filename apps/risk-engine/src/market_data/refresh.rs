//! Leg Greeks refresh.
//!
//! Fills per-contract Greeks on every leg ahead of a pipeline run. For each
//! option leg the first available source wins:
//!
//! 1. Greeks quoted by the provider
//! 2. Kernel Greeks at the volatility implied by the provider's mark
//! 3. Kernel Greeks at the leg's stored IV, the underlying's historical
//!    volatility, or the configured default, in that order
//!
//! Stock legs always get delta 1. When every leg can be marked, the
//! strategy's `current_pnl` is rewritten as market value minus premium.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, Level, debug, span, warn};

use super::cache::QuoteCache;
use super::port::{
    ContractKey, MarketDataError, MarketDataProvider, OptionMark, UnderlyingSnapshot,
};
use crate::config::PricingConfig;
use crate::models::{Greeks, Leg, Portfolio, Strategy};
use crate::observability;
use crate::pricing::{
    IvQuery, IvSolver, OptionInputs, OptionKind, OptionValuation, price_option, to_decimal, to_f64,
};

/// Where a leg's Greeks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreeksSource {
    /// Quoted by the provider.
    Provider,
    /// Kernel at the volatility implied by the mark.
    ImpliedFromMark,
    /// Kernel at a stored, historical or default volatility.
    Model,
    /// Stock leg, delta 1.
    Stock,
}

/// Outcome of refreshing one strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    /// Source per leg, `None` where the leg could not be priced.
    pub sources: Vec<Option<GreeksSource>>,
    /// Whether `current_pnl` was rewritten from marks.
    pub pnl_updated: bool,
}

impl RefreshSummary {
    /// Indices of legs left without fresh Greeks.
    pub fn unresolved(&self) -> impl Iterator<Item = usize> + '_ {
        self.sources
            .iter()
            .enumerate()
            .filter_map(|(idx, src)| src.is_none().then_some(idx))
    }

    /// Number of legs whose Greeks came from `source`.
    #[must_use]
    pub fn count(&self, source: GreeksSource) -> usize {
        self.sources.iter().filter(|s| **s == Some(source)).count()
    }
}

/// Outcome of refreshing a whole portfolio.
#[derive(Debug, Default)]
pub struct PortfolioRefresh {
    /// Per-strategy summaries, `None` for strategies that failed.
    pub summaries: Vec<Option<RefreshSummary>>,
    /// Market data failures by strategy index. Those strategies keep their
    /// previous leg Greeks.
    pub failures: Vec<(usize, MarketDataError)>,
}

/// Refreshes leg Greeks from a market data provider.
#[derive(Debug, Clone)]
pub struct LegGreeksRefresher {
    pricing: PricingConfig,
    solver: IvSolver,
}

impl Default for LegGreeksRefresher {
    fn default() -> Self {
        Self::new(&PricingConfig::default())
    }
}

impl LegGreeksRefresher {
    /// Create a refresher with the given pricing parameters.
    #[must_use]
    pub fn new(pricing: &PricingConfig) -> Self {
        Self {
            solver: IvSolver::new(pricing.iv_solver.clone()),
            pricing: pricing.clone(),
        }
    }

    /// Refresh every leg of one strategy.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the underlying or a mark cannot be
    /// fetched. Legs are only written once all lookups succeed.
    pub async fn refresh_strategy<P>(
        &self,
        strategy: &mut Strategy,
        cache: &mut QuoteCache<'_, P>,
        as_of: NaiveDate,
    ) -> Result<RefreshSummary, MarketDataError>
    where
        P: MarketDataProvider + ?Sized,
    {
        let underlying = cache.underlying(&strategy.ticker, as_of).await?;

        let mut updates = Vec::with_capacity(strategy.legs.len());
        for leg in &strategy.legs {
            let mark = match ContractKey::for_leg(leg) {
                Some(key) => cache.option_mark(&strategy.ticker, as_of, &key).await?,
                None => None,
            };
            updates.push(self.resolve_leg(leg, &underlying, mark));
        }

        let mut summary = RefreshSummary {
            sources: Vec::with_capacity(updates.len()),
            pnl_updated: false,
        };
        let mut market_value = Some(Decimal::ZERO);

        for (leg, update) in strategy.legs.iter_mut().zip(updates) {
            let Some(update) = update else {
                summary.sources.push(None);
                market_value = None;
                continue;
            };
            leg.greeks = Some(update.greeks);
            if let Some(vol) = update.volatility {
                leg.implied_volatility = Some(vol);
            }
            // An unrepresentable value leaves the P&L as it was.
            market_value = market_value.and_then(|mv| {
                let factor = leg.position_size.checked_mul(leg.multiplier)?;
                mv.checked_add(update.unit_value.checked_mul(factor)?)
            });
            summary.sources.push(Some(update.source));
        }

        let pnl = market_value
            .filter(|_| !strategy.legs.is_empty())
            .and_then(|value| value.checked_sub(strategy.premium));
        if let Some(pnl) = pnl {
            strategy.current_pnl = pnl;
            summary.pnl_updated = true;
        }

        Ok(summary)
    }

    /// Refresh every strategy in a portfolio, isolating failures.
    ///
    /// A strategy whose lookups fail keeps its previous Greeks and P&L and
    /// is reported in [`PortfolioRefresh::failures`].
    pub async fn refresh_portfolio<P>(
        &self,
        portfolio: &mut Portfolio,
        cache: &mut QuoteCache<'_, P>,
        as_of: NaiveDate,
    ) -> PortfolioRefresh
    where
        P: MarketDataProvider + ?Sized,
    {
        let span = span!(Level::INFO, "leg_refresh", strategies = portfolio.strategies.len(), %as_of);

        async move {
            let mut outcome = PortfolioRefresh::default();
            for (index, strategy) in portfolio.strategies.iter_mut().enumerate() {
                match self.refresh_strategy(strategy, cache, as_of).await {
                    Ok(summary) => {
                        let unresolved: Vec<usize> = summary.unresolved().collect();
                        if !unresolved.is_empty() {
                            warn!(index, ticker = %strategy.ticker, ?unresolved, "Legs left without Greeks");
                        }
                        outcome.summaries.push(Some(summary));
                    }
                    Err(err) => {
                        warn!(index, ticker = %strategy.ticker, error = %err, "Market data refresh failed");
                        outcome.summaries.push(None);
                        outcome.failures.push((index, err));
                    }
                }
            }

            let stats = cache.stats();
            debug!(hits = stats.hits, misses = stats.misses, "Quote cache");
            outcome
        }
        .instrument(span)
        .await
    }

    fn resolve_leg(
        &self,
        leg: &Leg,
        underlying: &UnderlyingSnapshot,
        mark: Option<OptionMark>,
    ) -> Option<LegUpdate> {
        let (Some(option_type), Some(strike)) = (leg.option_type, leg.strike) else {
            return Some(LegUpdate {
                greeks: Greeks::with_delta(Decimal::ONE),
                volatility: None,
                unit_value: underlying.price,
                source: GreeksSource::Stock,
            });
        };

        let kind = OptionKind::from(option_type);
        let spot = to_f64(underlying.price);
        let strike = to_f64(strike);
        let years = self.pricing.years(leg.days_to_expiry);
        let mark = mark.unwrap_or_default();

        if let Some(greeks) = mark.greeks {
            let unit_value = match mark.price {
                Some(price) => price,
                None => {
                    let vol = mark.implied_volatility.or(leg.implied_volatility);
                    let sigma = self.fallback_volatility(vol, underlying);
                    to_decimal(self.kernel(spot, strike, years, sigma, kind)?.price)
                }
            };
            return Some(LegUpdate {
                greeks,
                volatility: mark.implied_volatility,
                unit_value,
                source: GreeksSource::Provider,
            });
        }

        if let Some(price) = mark.price {
            let query = IvQuery {
                market_price: to_f64(price),
                spot,
                strike,
                time_to_expiry: years,
                rate: self.pricing.risk_free_rate,
                dividend_yield: self.pricing.dividend_yield,
                kind,
            };
            match self.solver.solve(&query) {
                Ok(solution) => {
                    observability::record_iv_iterations(solution.iterations);
                    let valuation = self.kernel(spot, strike, years, solution.volatility, kind)?;
                    return Some(LegUpdate {
                        greeks: to_greeks(&valuation),
                        volatility: Some(to_decimal(solution.volatility)),
                        unit_value: price,
                        source: GreeksSource::ImpliedFromMark,
                    });
                }
                Err(err) => debug!(error = %err, "Implied volatility unavailable, using model volatility"),
            }
        }

        let stored = mark.implied_volatility.or(leg.implied_volatility);
        let sigma = self.fallback_volatility(stored, underlying);
        let valuation = self.kernel(spot, strike, years, sigma, kind)?;
        Some(LegUpdate {
            greeks: to_greeks(&valuation),
            volatility: None,
            unit_value: mark.price.unwrap_or_else(|| to_decimal(valuation.price)),
            source: GreeksSource::Model,
        })
    }

    fn fallback_volatility(&self, stored: Option<Decimal>, underlying: &UnderlyingSnapshot) -> f64 {
        stored
            .or(underlying.historical_volatility)
            .map(to_f64)
            .filter(|v| *v > 0.0)
            .unwrap_or(self.pricing.default_volatility)
    }

    fn kernel(
        &self,
        spot: f64,
        strike: f64,
        years: f64,
        volatility: f64,
        kind: OptionKind,
    ) -> Option<OptionValuation> {
        let inputs = OptionInputs {
            spot,
            strike,
            time_to_expiry: years,
            rate: self.pricing.risk_free_rate,
            dividend_yield: self.pricing.dividend_yield,
            volatility,
            kind,
        };
        match price_option(&inputs) {
            Ok(valuation) => Some(valuation),
            Err(err) => {
                debug!(error = %err, spot, strike, "Kernel rejected leg inputs");
                None
            }
        }
    }
}

struct LegUpdate {
    greeks: Greeks,
    volatility: Option<Decimal>,
    unit_value: Decimal,
    source: GreeksSource,
}

fn to_greeks(valuation: &OptionValuation) -> Greeks {
    Greeks::new(
        to_decimal(valuation.delta),
        to_decimal(valuation.gamma),
        to_decimal(valuation.theta),
        to_decimal(valuation.vega),
    )
}
