//! Market Data Port (Driven Port)
//!
//! Interface the leg refresher uses to fetch underlying prices and option
//! marks. Implementations live with the caller (live feed, synthetic chain,
//! test double); the risk pipeline itself never calls this.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Greeks, Leg, OptionType};

/// Underlying price data for one ticker and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingSnapshot {
    /// Current price.
    pub price: Decimal,
    /// Previous session close.
    pub previous_close: Decimal,
    /// Annualized historical volatility (0.25 = 25%).
    #[serde(default)]
    pub historical_volatility: Option<Decimal>,
}

impl UnderlyingSnapshot {
    /// One-day change as a fraction of the previous close; zero when the
    /// previous close is zero.
    #[must_use]
    pub fn change_pct(&self) -> Decimal {
        if self.previous_close.is_zero() {
            Decimal::ZERO
        } else {
            (self.price - self.previous_close) / self.previous_close
        }
    }
}

/// Identifies one option contract on an underlying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractKey {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike price.
    pub strike: Decimal,
    /// Calendar days to expiry.
    pub days_to_expiry: u32,
    /// Expiry date, when known.
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
}

impl ContractKey {
    /// Key for an option leg; `None` for stock legs.
    #[must_use]
    pub fn for_leg(leg: &Leg) -> Option<Self> {
        Some(Self {
            option_type: leg.option_type?,
            strike: leg.strike?,
            days_to_expiry: leg.days_to_expiry,
            expiry: leg.expiry,
        })
    }
}

/// Market observation for one option contract. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionMark {
    /// Mid or last price per share.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Per-contract Greeks, in the engine's units.
    #[serde(default)]
    pub greeks: Option<Greeks>,
    /// Implied volatility.
    #[serde(default)]
    pub implied_volatility: Option<Decimal>,
}

/// Market data error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    /// Connection error.
    #[error("Market data connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// Ticker or contract not found.
    #[error("Not found: {resource}")]
    NotFound {
        /// The missing ticker or contract.
        resource: String,
    },

    /// Data unavailable.
    #[error("Market data unavailable: {message}")]
    DataUnavailable {
        /// Error details.
        message: String,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },
}

/// Port for market data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current and previous price plus historical volatility.
    async fn underlying(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<UnderlyingSnapshot, MarketDataError>;

    /// Mark for one contract; `Ok(None)` when the chain has no such strike.
    async fn option_mark(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        contract: &ContractKey,
    ) -> Result<Option<OptionMark>, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn change_pct_guards_zero_close() {
        let snap = UnderlyingSnapshot {
            price: dec!(102),
            previous_close: dec!(100),
            historical_volatility: None,
        };
        assert_eq!(snap.change_pct(), dec!(0.02));

        let fresh = UnderlyingSnapshot {
            previous_close: Decimal::ZERO,
            ..snap
        };
        assert_eq!(fresh.change_pct(), Decimal::ZERO);
    }

    #[test]
    fn contract_key_only_for_options() {
        let leg = Leg::option(OptionType::Put, dec!(95), 21, dec!(-1), dec!(-120));
        let key = ContractKey::for_leg(&leg).unwrap();
        assert_eq!(key.strike, dec!(95));
        assert_eq!(key.days_to_expiry, 21);
        assert!(ContractKey::for_leg(&Leg::stock(dec!(10), dec!(1000))).is_none());
    }
}
