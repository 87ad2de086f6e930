//! Options pricing.
//!
//! This module provides:
//! - The Black-Scholes kernel (price, Greeks, probability in the money)
//! - Implied volatility computation (Newton-Raphson, bisection, hybrid)
//!
//! The kernel works in `f64`; callers convert to `Decimal` at their boundary.
//!
//! # Example
//!
//! ```ignore
//! use risk_engine::pricing::{OptionInputs, OptionKind, price_option};
//!
//! let quote = price_option(&OptionInputs {
//!     spot: 100.0,
//!     strike: 100.0,
//!     time_to_expiry: 30.0 / 365.0,
//!     rate: 0.03,
//!     dividend_yield: 0.0,
//!     volatility: 0.20,
//!     kind: OptionKind::Call,
//! })?;
//! ```

mod black_scholes;
mod iv;

pub use black_scholes::{
    OptionInputs, OptionKind, OptionValuation, PricingError, intrinsic, price_option, prob_above,
};
pub use iv::{IvError, IvQuery, IvSolution, IvSolver, IvSolverConfig};

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::models::OptionType;

/// Convert a kernel output to `Decimal`; non-finite values become zero.
#[must_use]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert a `Decimal` to a kernel input.
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

impl From<OptionType> for OptionKind {
    fn from(value: OptionType) -> Self {
        match value {
            OptionType::Call => Self::Call,
            OptionType::Put => Self::Put,
        }
    }
}
