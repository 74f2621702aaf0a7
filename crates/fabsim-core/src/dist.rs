//! Flow-size distributions.
//!
//! Each variant maps a uniform draw `u ∈ [0, 1]` to a positive integer flow
//! size through its quantile (inverse-CDF) function. Construction is
//! table-driven from config by name; parameter violations fail fast with
//! [`SimError::InvalidParameters`].

use rand::Rng;
use rand::RngExt as _;

use crate::error::{Result, SimError};

/// A flow-size distribution, closed over the variants the fabric supports.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowSizeDist {
    /// Pareto with shape `alpha`, truncated to `[lower, upper]`.
    BoundedPareto { lower: f64, upper: f64, alpha: f64 },
    /// Uniform integer sizes over `[min, max]`.
    Uniform { min: u64, max: u64 },
    /// Every flow has the same size.
    Constant { size: u64 },
}

impl FlowSizeDist {
    pub fn bounded_pareto(lower: f64, upper: f64, alpha: f64) -> Result<Self> {
        if lower <= 0.0 || upper <= lower || alpha <= 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "bounded pareto requires 0 < lower < upper and alpha > 0, \
                 got lower={lower}, upper={upper}, alpha={alpha}"
            )));
        }
        Ok(Self::BoundedPareto {
            lower,
            upper,
            alpha,
        })
    }

    pub fn uniform(min: u64, max: u64) -> Result<Self> {
        if min == 0 || min >= max {
            return Err(SimError::InvalidParameters(format!(
                "uniform flow sizes require 0 < min < max, got min={min}, max={max}"
            )));
        }
        Ok(Self::Uniform { min, max })
    }

    pub fn constant(size: u64) -> Result<Self> {
        if size == 0 {
            return Err(SimError::InvalidParameters(
                "constant flow size must be positive".into(),
            ));
        }
        Ok(Self::Constant { size })
    }

    /// Inverse CDF: the flow size at cumulative probability `u`.
    ///
    /// Fails with [`SimError::OutOfRange`] when `u ∉ [0, 1]`. For the
    /// bounded Pareto, `u = 0` yields the lower bound and `u = 1` the upper
    /// bound (after integer truncation and clamping).
    pub fn quantile(&self, u: f64) -> Result<u64> {
        if !(0.0..=1.0).contains(&u) {
            return Err(SimError::OutOfRange(format!(
                "quantile input {u} outside [0, 1]"
            )));
        }
        Ok(self.quantile_clamped(u))
    }

    /// The flow size at percentile `p ∈ [0, 100]`.
    pub fn percentile(&self, p: f64) -> Result<u64> {
        if !(0.0..=100.0).contains(&p) {
            return Err(SimError::OutOfRange(format!(
                "percentile {p} outside [0, 100]"
            )));
        }
        Ok(self.quantile_clamped(p / 100.0))
    }

    /// Draws a random flow size.
    pub fn sample(&self, rng: &mut impl Rng) -> u64 {
        self.quantile_clamped(rng.random::<f64>())
    }

    fn quantile_clamped(&self, u: f64) -> u64 {
        match *self {
            Self::BoundedPareto {
                lower,
                upper,
                alpha,
            } => {
                // F(x) = (1 - (L/x)^a) / (1 - (L/U)^a), solved for x at F = u.
                let denominator =
                    (1.0 - u * (1.0 - (lower / upper).powf(alpha))).powf(1.0 / alpha);
                let x = lower / denominator;
                (x as u64).clamp(lower as u64, upper as u64)
            }
            Self::Uniform { min, max } => min + (u * (max - min) as f64) as u64,
            Self::Constant { size } => size,
        }
    }

    /// Cumulative probability of a flow of size `x`. Used to cross-check
    /// the quantile function.
    pub fn cdf(&self, x: f64) -> f64 {
        match *self {
            Self::BoundedPareto {
                lower,
                upper,
                alpha,
            } => {
                if x < lower {
                    0.0
                } else if x > upper {
                    1.0
                } else {
                    (1.0 - (lower / x).powf(alpha)) / (1.0 - (lower / upper).powf(alpha))
                }
            }
            Self::Uniform { min, max } => {
                ((x - min as f64) / (max - min) as f64).clamp(0.0, 1.0)
            }
            Self::Constant { size } => {
                if x < size as f64 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Theoretical mean flow size, used to derive an arrival rate from a
    /// utilization target.
    pub fn mean(&self) -> f64 {
        match *self {
            Self::BoundedPareto {
                lower,
                upper,
                alpha,
            } => {
                if (alpha - 1.0).abs() < 1e-12 {
                    // alpha = 1 degenerates the closed form.
                    (upper * lower / (upper - lower)) * (upper / lower).ln()
                } else {
                    let numerator = lower.powf(alpha) * (alpha / (alpha - 1.0))
                        * (1.0 / lower.powf(alpha - 1.0) - 1.0 / upper.powf(alpha - 1.0));
                    let denominator = 1.0 - (lower / upper).powf(alpha);
                    numerator / denominator
                }
            }
            Self::Uniform { min, max } => (min + max) as f64 / 2.0,
            Self::Constant { size } => size as f64,
        }
    }
}
