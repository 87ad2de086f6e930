//! Breakeven search.
//!
//! Known shapes (single option, vertical, four-leg condor/butterfly family)
//! get closed-form strike ± premium answers. Everything else, or any
//! analytic answer that fails verification, goes through a grid scan of
//! the payoff with linear interpolation at each sign change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ValuationConfig;
use crate::models::{OptionType, Strategy};
use crate::pricing::{PricingError, to_f64};

use super::payoff::PayoffModel;

/// How the breakevens were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakevenMethod {
    /// Closed-form strike/premium arithmetic for a recognised shape.
    Analytic,
    /// Dense grid scan of the payoff.
    NumericScan,
}

/// Closed-form breakevens for recognised shapes, ascending.
///
/// Returns `None` for stock legs, mixed expiries, unequal leg sizes or
/// any shape outside the supported set.
pub(crate) fn analytic_breakevens(strategy: &Strategy) -> Option<Vec<f64>> {
    let legs = &strategy.legs;
    let first = legs.first()?;
    if legs
        .iter()
        .any(|l| !l.is_option() || l.days_to_expiry != first.days_to_expiry)
    {
        return None;
    }

    let units = first.exposure_factor().abs();
    if units.is_zero() || legs.iter().any(|l| l.exposure_factor().abs() != units) {
        return None;
    }
    let per_share = to_f64(strategy.premium.abs() / units);

    let mut quoted = Vec::with_capacity(legs.len());
    for leg in legs {
        quoted.push((leg.option_type?, to_f64(leg.strike?), leg.position_size));
    }

    let points = match quoted.as_slice() {
        [(OptionType::Call, k, _)] => vec![k + per_share],
        [(OptionType::Put, k, _)] => vec![k - per_share],
        [(t1, k1, s1), (t2, k2, s2)]
            if t1 == t2 && s1.is_sign_positive() != s2.is_sign_positive() =>
        {
            match t1 {
                OptionType::Call => vec![k1.min(*k2) + per_share],
                OptionType::Put => vec![k1.max(*k2) - per_share],
            }
        }
        [_, _, _, _] => four_leg_breakevens(&quoted, per_share)?,
        _ => return None,
    };

    points.iter().all(|p| p.is_finite() && *p > 0.0).then_some(points)
}

fn four_leg_breakevens(quoted: &[(OptionType, f64, Decimal)], per_share: f64) -> Option<Vec<f64>> {
    let mut strikes: Vec<f64> = quoted.iter().map(|q| q.1).collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();
    if !(2..=4).contains(&strikes.len()) {
        return None;
    }

    let strikes_of = |kind: OptionType| quoted.iter().filter(move |q| q.0 == kind).map(|q| q.1);
    let puts = strikes_of(OptionType::Put).count();
    let calls = strikes_of(OptionType::Call).count();

    let (low, high) = if puts > 0 && calls > 0 {
        let put_max = strikes_of(OptionType::Put).fold(f64::NEG_INFINITY, f64::max);
        let call_min = strikes_of(OptionType::Call).fold(f64::INFINITY, f64::min);
        (put_max - per_share, call_min + per_share)
    } else {
        (strikes[0] + per_share, strikes[strikes.len() - 1] - per_share)
    };

    (low < high).then(|| vec![low, high])
}

/// Whether every point zeroes the payoff within tolerance.
pub(crate) fn verify(
    payoff: &PayoffModel,
    points: &[f64],
    tolerance: f64,
) -> Result<bool, PricingError> {
    let scale = payoff.premium().abs().max(1.0);
    for &point in points {
        if payoff.pnl_at(point)?.abs() > tolerance * scale {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Scan `[grid_lower × spot, grid_upper × spot]` for sign changes.
pub(crate) fn scan_breakevens(
    payoff: &PayoffModel,
    spot: f64,
    config: &ValuationConfig,
) -> Result<Vec<f64>, PricingError> {
    let lower = config.grid_lower * spot;
    let upper = config.grid_upper * spot;
    let steps = config.grid_points.max(2) - 1;
    #[allow(clippy::cast_precision_loss)]
    let step = (upper - lower) / steps as f64;

    let mut breakevens = Vec::new();
    let mut prev_x = lower;
    let mut prev_pnl = payoff.pnl_at(prev_x)?;
    if prev_pnl == 0.0 {
        breakevens.push(prev_x);
    }

    for i in 1..=steps {
        #[allow(clippy::cast_precision_loss)]
        let x = lower + step * i as f64;
        let pnl = payoff.pnl_at(x)?;

        if pnl == 0.0 {
            if prev_pnl != 0.0 {
                breakevens.push(x);
            }
        } else if prev_pnl * pnl < 0.0 {
            breakevens.push(prev_x - prev_pnl * (x - prev_x) / (pnl - prev_pnl));
        }

        prev_x = x;
        prev_pnl = pnl;
    }

    Ok(breakevens)
}
