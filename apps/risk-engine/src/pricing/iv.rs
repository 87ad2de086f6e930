//! Implied Volatility Solver
//!
//! Recovers the volatility that reproduces an observed option price:
//! - Newton-Raphson: Fast convergence (2-4 iterations) for well-behaved cases
//! - Modified Corrado-Miller: Initial guess for Newton-Raphson
//! - Bisection: Guaranteed convergence for edge cases (deep ITM/OTM)

// Black-Scholes uses standard mathematical notation (s, k, t, r, q, sigma)
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::black_scholes::{OptionInputs, OptionKind, price_option};

/// Errors from IV computation.
#[derive(Debug, Error)]
pub enum IvError {
    /// Convergence failed after max iterations.
    #[error(
        "IV solver failed to converge after {iterations} iterations (last error: {last_error:.6})"
    )]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Last price error.
        last_error: f64,
    },

    /// Invalid input parameters.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },

    /// No solution exists (e.g., price below intrinsic value).
    #[error("No valid IV solution: {reason}")]
    NoSolution {
        /// Reason no solution exists.
        reason: String,
    },
}

/// Configuration for IV solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvSolverConfig {
    /// Maximum iterations for Newton-Raphson.
    pub max_iterations: u32,
    /// Convergence tolerance (absolute price error).
    pub tolerance: f64,
    /// Minimum volatility bound (e.g., 0.01 = 1%).
    pub min_vol: f64,
    /// Maximum volatility bound (e.g., 5.0 = 500%).
    pub max_vol: f64,
    /// Switch to bisection when strike is this far from money (e.g., 0.20 = 20%).
    pub hybrid_threshold: f64,
}

impl Default for IvSolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            min_vol: 0.001,
            max_vol: 5.0,
            hybrid_threshold: 0.20,
        }
    }
}

/// A converged implied volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvSolution {
    /// Annualised volatility.
    pub volatility: f64,
    /// Iterations used by the method that converged.
    pub iterations: u32,
}

/// Market observation to invert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvQuery {
    /// Observed option price per share.
    pub market_price: f64,
    /// Spot price.
    pub spot: f64,
    /// Strike price.
    pub strike: f64,
    /// Time to expiration in years.
    pub time_to_expiry: f64,
    /// Risk-free rate.
    pub rate: f64,
    /// Dividend yield.
    pub dividend_yield: f64,
    /// Call or put.
    pub kind: OptionKind,
}

impl IvQuery {
    fn price_at(&self, sigma: f64) -> f64 {
        self.evaluate(sigma).0
    }

    /// (price, annual vega) at `sigma`.
    fn evaluate(&self, sigma: f64) -> (f64, f64) {
        let inputs = OptionInputs {
            spot: self.spot,
            strike: self.strike,
            time_to_expiry: self.time_to_expiry,
            rate: self.rate,
            dividend_yield: self.dividend_yield,
            volatility: sigma,
            kind: self.kind,
        };
        price_option(&inputs).map_or((f64::NAN, 0.0), |v| (v.price, v.vega * 100.0))
    }
}

/// Implied Volatility Solver.
#[derive(Debug, Clone)]
pub struct IvSolver {
    config: IvSolverConfig,
}

impl Default for IvSolver {
    fn default() -> Self {
        Self::new(IvSolverConfig::default())
    }
}

impl IvSolver {
    /// Create a new IV solver with the given configuration.
    #[must_use]
    pub const fn new(config: IvSolverConfig) -> Self {
        Self { config }
    }

    /// Compute implied volatility using the hybrid approach.
    ///
    /// Uses Newton-Raphson for near-the-money options and bisection
    /// for far-from-the-money options where vega is small.
    ///
    /// # Errors
    ///
    /// Returns `IvError` for non-positive inputs, a price below intrinsic
    /// value, or when neither method converges.
    pub fn solve(&self, query: &IvQuery) -> Result<IvSolution, IvError> {
        Self::validate(query)?;

        let IvQuery {
            market_price,
            spot: s,
            strike: k,
            time_to_expiry: t,
            rate: r,
            dividend_yield: q,
            kind,
        } = *query;

        let intrinsic = match kind {
            OptionKind::Call => (s * (-q * t).exp() - k * (-r * t).exp()).max(0.0),
            OptionKind::Put => (k * (-r * t).exp() - s * (-q * t).exp()).max(0.0),
        };

        if market_price < intrinsic - self.config.tolerance {
            return Err(IvError::NoSolution {
                reason: format!(
                    "Market price ({market_price:.4}) is below intrinsic value ({intrinsic:.4})"
                ),
            });
        }

        let moneyness = (s / k).ln().abs();

        if moneyness > self.config.hybrid_threshold {
            self.bisection(query)
        } else {
            let initial_guess = self.corrado_miller_guess(query);
            self.newton_raphson(query, initial_guess)
                .or_else(|_| self.bisection(query))
        }
    }

    fn validate(query: &IvQuery) -> Result<(), IvError> {
        let checks = [
            ("Market price", query.market_price),
            ("Stock price", query.spot),
            ("Strike price", query.strike),
            ("Time to expiration", query.time_to_expiry),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(IvError::InvalidInput {
                    message: format!("{name} must be positive, got: {value}"),
                });
            }
        }
        Ok(())
    }

    /// Modified Corrado-Miller initial guess for Newton-Raphson.
    fn corrado_miller_guess(&self, query: &IvQuery) -> f64 {
        let IvQuery {
            market_price,
            spot: s,
            strike: k,
            time_to_expiry: t,
            rate: r,
            dividend_yield: q,
            kind,
        } = *query;

        let f = s * ((r - q) * t).exp();
        let df = (-r * t).exp();

        // Put-call parity
        let call_price = match kind {
            OptionKind::Call => market_price,
            OptionKind::Put => market_price + df * (f - k),
        };

        let x = f - k;
        let y = call_price / df;

        if y <= 0.0 {
            return 0.30;
        }

        let numerator = y - 0.5 * x;
        let sqrt_term = (y - 0.5 * x).powi(2) - (x.powi(2) / PI);

        if sqrt_term < 0.0 {
            return 0.30;
        }

        let sigma_approx = (PI / (2.0 * t)).sqrt() * (numerator + sqrt_term.sqrt()) / f;
        sigma_approx.clamp(self.config.min_vol, self.config.max_vol)
    }

    fn newton_raphson(&self, query: &IvQuery, initial_guess: f64) -> Result<IvSolution, IvError> {
        let mut sigma = initial_guess.clamp(self.config.min_vol, self.config.max_vol);

        for i in 0..self.config.max_iterations {
            let (price, vega) = query.evaluate(sigma);
            let error = price - query.market_price;

            if error.abs() < self.config.tolerance {
                return Ok(IvSolution {
                    volatility: sigma,
                    iterations: i + 1,
                });
            }

            // Vega too small, let bisection take over
            if vega.abs() < 1e-12 {
                return Err(IvError::ConvergenceFailed {
                    iterations: i,
                    last_error: error.abs(),
                });
            }

            sigma -= error / vega;
            sigma = sigma.clamp(self.config.min_vol, self.config.max_vol);
        }

        Err(IvError::ConvergenceFailed {
            iterations: self.config.max_iterations,
            last_error: (query.price_at(sigma) - query.market_price).abs(),
        })
    }

    fn bisection(&self, query: &IvQuery) -> Result<IvSolution, IvError> {
        let mut low = self.config.min_vol;
        let mut high = self.config.max_vol;
        let market_price = query.market_price;

        let price_low = query.price_at(low);
        let price_high = query.price_at(high);

        if market_price < price_low {
            return Err(IvError::NoSolution {
                reason: format!(
                    "Market price ({market_price:.4}) is below minimum theoretical price ({price_low:.4})"
                ),
            });
        }
        if market_price > price_high {
            return Err(IvError::NoSolution {
                reason: format!(
                    "Market price ({market_price:.4}) exceeds maximum theoretical price ({price_high:.4})"
                ),
            });
        }

        for i in 0..self.config.max_iterations {
            let mid = low.midpoint(high);
            let error = query.price_at(mid) - market_price;

            if error.abs() < self.config.tolerance || (high - low) < 1e-10 {
                return Ok(IvSolution {
                    volatility: mid,
                    iterations: i + 1,
                });
            }

            if error > 0.0 {
                high = mid;
            } else {
                low = mid;
            }
        }

        Err(IvError::ConvergenceFailed {
            iterations: self.config.max_iterations,
            last_error: (query.price_at(low.midpoint(high)) - market_price).abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    fn query_for(s: f64, k: f64, t: f64, r: f64, q: f64, vol: f64, kind: OptionKind) -> IvQuery {
        let mut query = IvQuery {
            market_price: 0.0,
            spot: s,
            strike: k,
            time_to_expiry: t,
            rate: r,
            dividend_yield: q,
            kind,
        };
        query.market_price = query.price_at(vol);
        query
    }

    #[test]
    fn test_iv_solver_atm_call() {
        let query = query_for(100.0, 100.0, 1.0, 0.05, 0.0, 0.25, OptionKind::Call);
        let solution = IvSolver::default().solve(&query).unwrap();
        assert!(approx_eq(solution.volatility, 0.25, 0.001));
        assert!(solution.iterations >= 1);
    }

    #[test]
    fn test_iv_solver_atm_put() {
        let query = query_for(100.0, 100.0, 0.5, 0.03, 0.01, 0.30, OptionKind::Put);
        let solution = IvSolver::default().solve(&query).unwrap();
        assert!(approx_eq(solution.volatility, 0.30, 0.001));
    }

    #[test]
    fn test_iv_solver_otm_call_uses_bisection() {
        // 30% OTM, beyond the hybrid threshold
        let query = query_for(100.0, 130.0, 0.25, 0.05, 0.0, 0.35, OptionKind::Call);
        let solution = IvSolver::default().solve(&query).unwrap();
        assert!(approx_eq(solution.volatility, 0.35, 0.01));
    }

    #[test]
    fn test_iv_solver_high_iv() {
        let query = query_for(50.0, 50.0, 0.1, 0.05, 0.0, 1.50, OptionKind::Call);
        let solution = IvSolver::default().solve(&query).unwrap();
        assert!(approx_eq(solution.volatility, 1.50, 0.02));
    }

    #[test]
    fn test_iv_solver_invalid_price() {
        let mut query = query_for(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionKind::Call);
        query.market_price = -1.0;
        assert!(matches!(
            IvSolver::default().solve(&query),
            Err(IvError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_iv_solver_below_intrinsic() {
        let mut query = query_for(120.0, 100.0, 0.5, 0.05, 0.0, 0.2, OptionKind::Call);
        // Intrinsic value ~ 22, try price of 15
        query.market_price = 15.0;
        assert!(matches!(
            IvSolver::default().solve(&query),
            Err(IvError::NoSolution { .. })
        ));
    }

    #[test]
    fn test_corrado_miller_guess_is_close() {
        let query = query_for(100.0, 100.0, 1.0, 0.05, 0.0, 0.25, OptionKind::Call);
        let guess = IvSolver::default().corrado_miller_guess(&query);
        assert!(approx_eq(guess, 0.25, 0.10));
    }
}
