//! Value-at-Risk estimators: historical, parametric, and Monte Carlo.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A VaR estimate expressed as a positive currency loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarEstimate {
    /// Loss not expected to be exceeded at the confidence level.
    pub var: f64,
    /// Expected loss conditional on exceeding the VaR threshold.
    pub cvar: f64,
    pub confidence: f64,
    pub observations: usize,
}

/// Historical-simulation VaR over a return series.
///
/// Sorts returns ascending and reads the `(1 - confidence)` percentile;
/// CVaR averages the tail up to and including that observation. An empty
/// series yields zeros: no data means no measurable risk, not an error.
pub fn historical_var(returns: &[f64], confidence: f64, portfolio_value: f64) -> VarEstimate {
    let n = returns.len();
    if n == 0 {
        return VarEstimate {
            var: 0.0,
            cvar: 0.0,
            confidence,
            observations: 0,
        };
    }

    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let index = (((1.0 - confidence) * n as f64).floor() as usize).min(n - 1);
    let var = -sorted[index] * portfolio_value;

    let tail = &sorted[..=index];
    let cvar = -(tail.iter().sum::<f64>() / tail.len() as f64) * portfolio_value;

    VarEstimate {
        var,
        cvar,
        confidence,
        observations: n,
    }
}

/// Parametric (variance-covariance) VaR under a normal assumption, scaled
/// to the horizon by the square-root-of-time rule.
pub fn parametric_var(
    mean: f64,
    std_dev: f64,
    confidence: f64,
    portfolio_value: f64,
    horizon_days: u32,
) -> VarEstimate {
    let z = z_score(confidence);
    let horizon_scale = (horizon_days.max(1) as f64).sqrt();
    let var = -(mean - z * std_dev) * portfolio_value * horizon_scale;

    // Normal-tail expected shortfall: phi(z) / (1 - confidence).
    let alpha = (1.0 - confidence).max(f64::EPSILON);
    let phi = (-z * z / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let cvar = (std_dev * phi / alpha - mean) * portfolio_value * horizon_scale;

    VarEstimate {
        var,
        cvar,
        confidence,
        observations: 0,
    }
}

/// Monte-Carlo VaR: simulate normal returns via the Box-Muller transform and
/// apply the historical percentile rule to the simulated distribution.
///
/// The random source is injected so tests can seed it and assert identical
/// estimates across runs.
pub fn monte_carlo_var<R: Rng>(
    mean: f64,
    std_dev: f64,
    portfolio_value: f64,
    n_simulations: usize,
    confidence: f64,
    rng: &mut R,
) -> VarEstimate {
    let mut simulated = Vec::with_capacity(n_simulations);
    for _ in 0..n_simulations {
        simulated.push(mean + std_dev * standard_normal(rng));
    }
    historical_var(&simulated, confidence, portfolio_value)
}

/// One standard-normal variate via Box-Muller.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // gen() is in [0, 1); shift off zero to keep ln() finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Z-scores for the supported confidence levels. Unknown levels fall back
/// to the 95% value.
fn z_score(confidence: f64) -> f64 {
    if (confidence - 0.90).abs() < 1e-9 {
        1.282
    } else if (confidence - 0.99).abs() < 1e-9 {
        2.326
    } else if (confidence - 0.95).abs() < 1e-9 {
        1.645
    } else {
        1.645
    }
}
