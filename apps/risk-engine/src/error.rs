//! Crate-level error type.
//!
//! Each module owns a `thiserror` enum; [`EngineError`] wraps them for
//! callers that drive several modules, and [`ErrorCode`] gives every
//! failure a stable machine-readable reason.
//!
//! | Code | Source |
//! |------|--------|
//! | `INVALID_STRATEGY` | [`ModelError`] |
//! | `INVALID_PRICING_INPUT` | [`PricingError`] |
//! | `RISK_OUT_OF_RANGE` | [`RiskError`] |
//! | `IMPLIED_VOLATILITY_FAILED` | [`IvError`] |
//! | `VALUATION_FAILED` | [`ValuationError`] |
//! | `MARKET_DATA_UNAVAILABLE` | [`MarketDataError`] |
//! | `INVALID_CONFIG` | [`ConfigError`] |
//! | `INTERNAL_ERROR` | thread pool and other runtime failures |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::market_data::MarketDataError;
use crate::models::ModelError;
use crate::pricing::{IvError, PricingError};
use crate::risk::RiskError;
use crate::valuation::ValuationError;

/// Error codes for the risk engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Strategy or leg failed ingestion validation.
    InvalidStrategy,
    /// Pricing kernel rejected its inputs.
    InvalidPricingInput,
    /// A risk output overflowed or exceeded the supported magnitude.
    RiskOutOfRange,
    /// Implied volatility could not be recovered.
    ImpliedVolatilityFailed,
    /// Strategy could not be valued.
    ValuationFailed,
    /// Market data lookup failed.
    MarketDataUnavailable,
    /// Configuration could not be loaded or validated.
    InvalidConfig,
    /// Unexpected runtime failure.
    InternalError,
}

impl ErrorCode {
    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidStrategy => "INVALID_STRATEGY",
            Self::InvalidPricingInput => "INVALID_PRICING_INPUT",
            Self::RiskOutOfRange => "RISK_OUT_OF_RANGE",
            Self::ImpliedVolatilityFailed => "IMPLIED_VOLATILITY_FAILED",
            Self::ValuationFailed => "VALUATION_FAILED",
            Self::MarketDataUnavailable => "MARKET_DATA_UNAVAILABLE",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same call can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::MarketDataUnavailable)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Any error the risk engine can produce.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Model validation failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Pricing kernel failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Risk computation failed.
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Implied volatility solver failed.
    #[error(transparent)]
    ImpliedVolatility(#[from] IvError),

    /// Valuation failed.
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    /// Market data failed.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Worker pool could not be built.
    #[error("Failed to build worker pool: {message}")]
    ThreadPool {
        /// Error message.
        message: String,
    },
}

impl EngineError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Model(_) => ErrorCode::InvalidStrategy,
            Self::Pricing(_) => ErrorCode::InvalidPricingInput,
            Self::Risk(_) => ErrorCode::RiskOutOfRange,
            Self::ImpliedVolatility(_) => ErrorCode::ImpliedVolatilityFailed,
            Self::Valuation(_) => ErrorCode::ValuationFailed,
            Self::MarketData(_) => ErrorCode::MarketDataUnavailable,
            Self::Config(_) => ErrorCode::InvalidConfig,
            Self::ThreadPool { .. } => ErrorCode::InternalError,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for EngineError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool {
            message: err.to_string(),
        }
    }
}
