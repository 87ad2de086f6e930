//! Ingestion validation errors for the portfolio model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Largest magnitude accepted for any numeric strategy or leg input (`1e12`).
pub const MAX_INPUT_MAGNITUDE: Decimal =
    Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Errors raised when a strategy or leg fails validation at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Ticker was empty.
    #[error("strategy ticker must not be empty")]
    EmptyTicker,

    /// Option leg without a call/put type.
    #[error("leg {leg_index}: option leg is missing its call/put type")]
    MissingOptionType {
        /// Index of the offending leg.
        leg_index: usize,
    },

    /// Option leg without a positive strike.
    #[error("leg {leg_index}: option strike must be positive, got {strike:?}")]
    InvalidStrike {
        /// Index of the offending leg.
        leg_index: usize,
        /// Strike supplied.
        strike: Option<Decimal>,
    },

    /// Stock leg carrying option-only fields.
    #[error("leg {leg_index}: stock leg must not carry an option type or strike")]
    StockWithOptionFields {
        /// Index of the offending leg.
        leg_index: usize,
    },

    /// Contract multiplier was zero or negative.
    #[error("leg {leg_index}: multiplier must be positive, got {multiplier}")]
    InvalidMultiplier {
        /// Index of the offending leg.
        leg_index: usize,
        /// Multiplier supplied.
        multiplier: Decimal,
    },

    /// Implied volatility was zero or negative.
    #[error("leg {leg_index}: implied volatility must be positive, got {volatility}")]
    InvalidVolatility {
        /// Index of the offending leg.
        leg_index: usize,
        /// Volatility supplied.
        volatility: Decimal,
    },

    /// Beta outside the accepted range.
    #[error("beta {beta} is outside the accepted range [-10, 10]")]
    InvalidBeta {
        /// Beta supplied.
        beta: Decimal,
    },

    /// Strategy-level numeric input too large to risk-manage.
    #[error("{field} {value} exceeds the accepted magnitude of 1e12")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Value supplied.
        value: Decimal,
    },

    /// Leg numeric input too large to risk-manage.
    #[error("leg {leg_index}: {field} {value} exceeds the accepted magnitude of 1e12")]
    LegOutOfRange {
        /// Index of the offending leg.
        leg_index: usize,
        /// Field name.
        field: &'static str,
        /// Value supplied.
        value: Decimal,
    },
}

/// Whether `value` is within [`MAX_INPUT_MAGNITUDE`].
pub(crate) fn within_input_range(value: Decimal) -> bool {
    value.abs() <= MAX_INPUT_MAGNITUDE
}
