//! Exposure estimator: Greeks into one-day dollar moves.

use rust_decimal::Decimal;

use crate::models::{ExpectedDailyMove, Greeks};

use super::error::{RiskError, checked};

/// Decompose one day's expected move for the given Greeks.
///
/// `underlying_move` is the assumed one-day move `m` in price points,
/// `vol_change` the assumed one-day volatility change in vol points.
///
/// # Errors
///
/// Returns `RiskError::Overflow` when a term does not fit in a `Decimal`.
pub fn strategy_exposure(
    greeks: &Greeks,
    underlying_move: Decimal,
    vol_change: Decimal,
) -> Result<ExpectedDailyMove, RiskError> {
    let move_squared = underlying_move.checked_mul(underlying_move);
    let convexity = move_squared
        .and_then(|m2| greeks.gamma.checked_mul(m2))
        .and_then(|g| g.checked_mul(Decimal::new(5, 1)));

    Ok(ExpectedDailyMove {
        directional: checked(greeks.delta.checked_mul(underlying_move), "directional move")?,
        convexity: checked(convexity, "convexity move")?,
        time_decay: greeks.theta,
        volatility: checked(greeks.vega.checked_mul(vol_change), "volatility move")?,
    })
}

/// Sum strategy exposures into the portfolio decomposition.
#[must_use]
pub fn portfolio_exposure<I>(moves: I) -> ExpectedDailyMove
where
    I: IntoIterator<Item = ExpectedDailyMove>,
{
    moves.into_iter().fold(ExpectedDailyMove::default(), |acc, m| acc + m)
}
