//! Black-Scholes pricing kernel.
//!
//! Prices a European option and its Greeks from (spot, strike, time, rate,
//! dividend yield, volatility). Greeks are reported in trading-desk units:
//! theta per calendar day, vega per one volatility point.

// Black-Scholes uses standard mathematical notation (s, k, t, r, q, sigma)
// Financial formulas use standard notation where mul_add() obscures meaning
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

use std::f64::consts::PI;

use thiserror::Error;

/// Calendar days used to express theta per day.
const THETA_DAYS: f64 = 365.0;

/// Option kind for the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

/// Errors from the pricing kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Invalid input parameters.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },
}

/// Inputs to one kernel evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionInputs {
    /// Spot price of the underlying (> 0).
    pub spot: f64,
    /// Strike price (> 0).
    pub strike: f64,
    /// Time to expiration in years; `<= 0` prices at intrinsic value.
    pub time_to_expiry: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuous dividend yield.
    pub dividend_yield: f64,
    /// Annualised volatility (> 0 unless expired).
    pub volatility: f64,
    /// Call or put.
    pub kind: OptionKind,
}

/// Kernel output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionValuation {
    /// Theoretical price per share.
    pub price: f64,
    /// Delta per share.
    pub delta: f64,
    /// Gamma per $1 move.
    pub gamma: f64,
    /// Theta per calendar day.
    pub theta: f64,
    /// Vega per volatility point.
    pub vega: f64,
    /// Risk-neutral probability of finishing in the money.
    pub prob_itm: f64,
}

/// Standard normal CDF (cumulative distribution function).
pub(crate) fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

/// Standard normal PDF (probability density function).
pub(crate) fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter.
fn d1(s: f64, k: f64, t: f64, r: f64, q: f64, sigma: f64) -> f64 {
    ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
}

/// Black-Scholes d2 parameter.
fn d2(s: f64, k: f64, t: f64, r: f64, q: f64, sigma: f64) -> f64 {
    d1(s, k, t, r, q, sigma) - sigma * t.sqrt()
}

/// Price an option and its Greeks.
///
/// Expired options (`time_to_expiry <= 0`) return intrinsic value, zero
/// gamma/theta/vega and a 0/±1 delta by moneyness. At-the-money expiry
/// counts as out of the money.
pub fn price_option(inputs: &OptionInputs) -> Result<OptionValuation, PricingError> {
    let OptionInputs {
        spot: s,
        strike: k,
        time_to_expiry: t,
        rate: r,
        dividend_yield: q,
        volatility: sigma,
        kind,
    } = *inputs;

    validate_positive("spot", s)?;
    validate_positive("strike", k)?;
    validate_finite("rate", r)?;
    validate_finite("dividend_yield", q)?;

    if t.is_nan() || t <= 0.0 {
        return Ok(expired(s, k, kind));
    }

    validate_positive("volatility", sigma)?;

    let d1_val = d1(s, k, t, r, q, sigma);
    let d2_val = d1_val - sigma * t.sqrt();
    let disc_q = (-q * t).exp();
    let disc_r = (-r * t).exp();
    let pdf_d1 = norm_pdf(d1_val);

    let gamma = disc_q * pdf_d1 / (s * sigma * t.sqrt());
    let vega = s * disc_q * pdf_d1 * t.sqrt() / 100.0;
    let decay = -s * disc_q * pdf_d1 * sigma / (2.0 * t.sqrt());

    let valuation = match kind {
        OptionKind::Call => {
            let nd1 = norm_cdf(d1_val);
            let nd2 = norm_cdf(d2_val);
            OptionValuation {
                price: s * disc_q * nd1 - k * disc_r * nd2,
                delta: disc_q * nd1,
                gamma,
                theta: (decay - r * k * disc_r * nd2 + q * s * disc_q * nd1) / THETA_DAYS,
                vega,
                prob_itm: nd2,
            }
        }
        OptionKind::Put => {
            let nmd1 = norm_cdf(-d1_val);
            let nmd2 = norm_cdf(-d2_val);
            OptionValuation {
                price: k * disc_r * nmd2 - s * disc_q * nmd1,
                delta: -disc_q * nmd1,
                gamma,
                theta: (decay + r * k * disc_r * nmd2 - q * s * disc_q * nmd1) / THETA_DAYS,
                vega,
                prob_itm: nmd2,
            }
        }
    };

    Ok(valuation)
}

/// Risk-neutral probability that the underlying finishes above `level`.
///
/// With no time left the answer is deterministic (1 if spot is above).
pub fn prob_above(spot: f64, level: f64, t: f64, r: f64, q: f64, sigma: f64) -> f64 {
    if level <= 0.0 {
        return 1.0;
    }
    if t <= 0.0 || sigma <= 0.0 || spot <= 0.0 {
        return if spot > level { 1.0 } else { 0.0 };
    }
    norm_cdf(d2(spot, level, t, r, q, sigma))
}

/// Value of an option at expiry, per share.
#[must_use]
pub fn intrinsic(s: f64, k: f64, kind: OptionKind) -> f64 {
    match kind {
        OptionKind::Call => (s - k).max(0.0),
        OptionKind::Put => (k - s).max(0.0),
    }
}

fn expired(s: f64, k: f64, kind: OptionKind) -> OptionValuation {
    let (delta, itm) = match kind {
        OptionKind::Call if s > k => (1.0, true),
        OptionKind::Call => (0.0, false),
        OptionKind::Put if s < k => (-1.0, true),
        OptionKind::Put => (0.0, false),
    };
    OptionValuation {
        price: intrinsic(s, k, kind),
        delta,
        gamma: 0.0,
        theta: 0.0,
        vega: 0.0,
        prob_itm: if itm { 1.0 } else { 0.0 },
    }
}

fn validate_positive(name: &str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidInput {
            message: format!("{name} must be positive, got: {value}"),
        })
    }
}

fn validate_finite(name: &str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::InvalidInput {
            message: format!("{name} must be finite, got: {value}"),
        })
    }
}
