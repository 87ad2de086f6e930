//! Risk computation errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Largest magnitude a per-strategy risk output may take (`1e20`).
///
/// Portfolio sums over strategies stay far from `Decimal::MAX` as long as
/// every strategy output is under this ceiling.
pub const MAX_RISK_MAGNITUDE: Decimal =
    Decimal::from_parts(1_661_992_960, 1_808_227_885, 5, false, 0);

/// Errors raised while computing one strategy's risk outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskError {
    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow computing {quantity}")]
    Overflow {
        /// Quantity being computed.
        quantity: &'static str,
    },

    /// Result is representable but too large to aggregate safely.
    #[error("{quantity} {value} exceeds the supported magnitude")]
    OutOfRange {
        /// Quantity being computed.
        quantity: &'static str,
        /// Offending value.
        value: Decimal,
    },
}

/// Turn a checked-arithmetic result into a `RiskError::Overflow`.
pub(crate) fn checked(
    value: Option<Decimal>,
    quantity: &'static str,
) -> Result<Decimal, RiskError> {
    value.ok_or(RiskError::Overflow { quantity })
}

/// Reject values above [`MAX_RISK_MAGNITUDE`].
pub(crate) fn bounded(value: Decimal, quantity: &'static str) -> Result<Decimal, RiskError> {
    if value.abs() > MAX_RISK_MAGNITUDE {
        Err(RiskError::OutOfRange { quantity, value })
    } else {
        Ok(value)
    }
}
