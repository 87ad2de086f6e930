//! Margin estimation.
//!
//! The pipeline only depends on [`MarginModel`]: strategy plus market in,
//! non-negative margin out. [`PremiumMarginModel`] is the placeholder
//! volatility-scaled premium formula; an exchange-rule model can be swapped
//! in without touching the pipeline.

use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::models::{RiskCategory, Strategy};
use crate::pricing::to_decimal;

use super::error::{RiskError, checked};
use super::market::MarketSnapshot;

/// Estimates the margin a strategy consumes.
pub trait MarginModel: Send + Sync {
    /// Margin for one strategy. Must be non-negative.
    ///
    /// # Errors
    ///
    /// Returns `RiskError` when the requirement cannot be represented.
    fn margin(&self, strategy: &Strategy, market: &MarketSnapshot) -> Result<Decimal, RiskError>;
}

/// Premium-based margin.
///
/// - Defined risk: `|premium|`
/// - Undefined risk: `multiplier × |premium| × (1 + VIX / vix_reference)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumMarginModel {
    undefined_multiplier: Decimal,
    vix_reference: Decimal,
}

impl PremiumMarginModel {
    /// Create a model from risk configuration.
    #[must_use]
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            undefined_multiplier: to_decimal(config.undefined_margin_multiplier),
            vix_reference: to_decimal(config.vix_reference),
        }
    }
}

impl Default for PremiumMarginModel {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}

impl MarginModel for PremiumMarginModel {
    fn margin(&self, strategy: &Strategy, market: &MarketSnapshot) -> Result<Decimal, RiskError> {
        let premium = strategy.premium.abs();
        match strategy.risk.risk_category {
            RiskCategory::Defined => Ok(premium),
            RiskCategory::Undefined => {
                let vol_scale = if self.vix_reference.is_zero() {
                    Some(Decimal::ONE)
                } else {
                    market
                        .vix
                        .max(Decimal::ZERO)
                        .checked_div(self.vix_reference)
                        .and_then(|ratio| ratio.checked_add(Decimal::ONE))
                };
                let margin = vol_scale
                    .and_then(|scale| premium.checked_mul(scale))
                    .and_then(|scaled| scaled.checked_mul(self.undefined_multiplier));
                checked(margin, "margin")
            }
        }
    }
}
