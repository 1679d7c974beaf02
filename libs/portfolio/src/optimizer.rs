//! Weight-vector optimizers: stochastic max-Sharpe, risk parity, equal weight.

use crate::covariance::{covariance_matrix, portfolio_return, portfolio_volatility};
use crate::error::{PortfolioError, Result};
use crate::AssetInput;
use pulse_types::OptimizationStrategy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Iteration budget for the risk-parity loop. Fixed rather than
/// tolerance-based so worst-case latency stays bounded.
const RISK_PARITY_ITERATIONS: usize = 100;

/// Sampling and refinement budget for the stochastic max-Sharpe search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Random weight vectors drawn in the global phase.
    pub samples: usize,
    /// Local perturbation rounds applied to the incumbent.
    pub refine_iters: usize,
    /// Maximum per-weight perturbation in the refinement phase.
    pub refine_step: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            samples: 2_000,
            refine_iters: 500,
            refine_step: 0.10,
        }
    }
}

/// Result of one optimizer call. Weights are non-negative and sum to 1
/// within floating tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub strategy: OptimizationStrategy,
    pub weights: BTreeMap<String, f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Stochastic max-Sharpe search: draw random non-negative weight vectors,
/// keep the best Sharpe, then refine the incumbent with small random
/// perturbations. An anytime heuristic, not an exact solve; it only needs
/// to beat equal weighting.
pub fn max_sharpe<R: Rng>(
    assets: &[AssetInput],
    risk_free_rate: f64,
    params: SearchParams,
    rng: &mut R,
) -> Result<OptimizationResult> {
    if assets.is_empty() {
        return Err(PortfolioError::EmptyBasket);
    }
    let covariance = covariance_matrix(assets);
    if is_degenerate(&covariance) {
        // Zero-variance basket: Sharpe is undefined, equal weight is the
        // safe answer.
        return equal_weight(assets, risk_free_rate);
    }

    let n = assets.len();
    let mut best = normalized_random(n, rng);
    let mut best_sharpe = sharpe(&best, assets, &covariance, risk_free_rate);

    for _ in 1..params.samples {
        let candidate = normalized_random(n, rng);
        let candidate_sharpe = sharpe(&candidate, assets, &covariance, risk_free_rate);
        if candidate_sharpe > best_sharpe {
            best = candidate;
            best_sharpe = candidate_sharpe;
        }
    }

    for _ in 0..params.refine_iters {
        let mut candidate = best.clone();
        for weight in candidate.iter_mut() {
            *weight = (*weight + (rng.gen::<f64>() - 0.5) * params.refine_step).max(0.0);
        }
        if !normalize(&mut candidate) {
            continue;
        }
        let candidate_sharpe = sharpe(&candidate, assets, &covariance, risk_free_rate);
        if candidate_sharpe > best_sharpe {
            best = candidate;
            best_sharpe = candidate_sharpe;
        }
    }

    Ok(build_result(
        OptimizationStrategy::Markowitz,
        best,
        assets,
        &covariance,
        risk_free_rate,
    ))
}

/// Risk parity: start from inverse-volatility weights and iterate toward
/// equal risk contribution (`weight × marginal contribution`), renormalizing
/// every pass. Runs a fixed iteration budget.
pub fn risk_parity(assets: &[AssetInput], risk_free_rate: f64) -> Result<OptimizationResult> {
    if assets.is_empty() {
        return Err(PortfolioError::EmptyBasket);
    }
    let covariance = covariance_matrix(assets);
    if is_degenerate(&covariance) {
        return equal_weight(assets, risk_free_rate);
    }

    let n = assets.len();
    let mut weights: Vec<f64> = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let sigma = covariance[i][i].max(0.0).sqrt().max(asset.volatility.abs());
            if sigma > 0.0 {
                1.0 / sigma
            } else {
                1.0
            }
        })
        .collect();
    normalize(&mut weights);

    for _ in 0..RISK_PARITY_ITERATIONS {
        let contributions: Vec<f64> = (0..n)
            .map(|i| {
                let marginal: f64 = (0..n).map(|j| covariance[i][j] * weights[j]).sum();
                weights[i] * marginal
            })
            .collect();

        let target = contributions.iter().sum::<f64>() / n as f64;
        if target <= 0.0 {
            break;
        }

        for i in 0..n {
            if contributions[i] > 0.0 {
                // Square-root damping keeps the iteration from oscillating.
                weights[i] *= (target / contributions[i]).sqrt();
            }
        }
        if !normalize(&mut weights) {
            return equal_weight(assets, risk_free_rate);
        }
    }

    Ok(build_result(
        OptimizationStrategy::RiskParity,
        weights,
        assets,
        &covariance,
        risk_free_rate,
    ))
}

/// Trivial `1/n` baseline; also the fallback for degenerate inputs.
pub fn equal_weight(assets: &[AssetInput], risk_free_rate: f64) -> Result<OptimizationResult> {
    if assets.is_empty() {
        return Err(PortfolioError::EmptyBasket);
    }
    let covariance = covariance_matrix(assets);
    let weights = vec![1.0 / assets.len() as f64; assets.len()];
    Ok(build_result(
        OptimizationStrategy::EqualWeight,
        weights,
        assets,
        &covariance,
        risk_free_rate,
    ))
}

/// Dispatch by strategy with a fresh default search budget.
pub fn optimize<R: Rng>(
    assets: &[AssetInput],
    strategy: OptimizationStrategy,
    risk_free_rate: f64,
    rng: &mut R,
) -> Result<OptimizationResult> {
    match strategy {
        OptimizationStrategy::Markowitz => {
            max_sharpe(assets, risk_free_rate, SearchParams::default(), rng)
        }
        OptimizationStrategy::RiskParity => risk_parity(assets, risk_free_rate),
        OptimizationStrategy::EqualWeight => equal_weight(assets, risk_free_rate),
    }
}

fn build_result(
    strategy: OptimizationStrategy,
    weights: Vec<f64>,
    assets: &[AssetInput],
    covariance: &[Vec<f64>],
    risk_free_rate: f64,
) -> OptimizationResult {
    let expected_return = portfolio_return(&weights, assets);
    let volatility = portfolio_volatility(&weights, covariance);
    let sharpe_ratio = if volatility > 0.0 {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    };

    OptimizationResult {
        strategy,
        weights: assets
            .iter()
            .zip(weights)
            .map(|(asset, weight)| (asset.symbol.clone(), weight))
            .collect(),
        expected_return,
        volatility,
        sharpe_ratio,
    }
}

fn sharpe(weights: &[f64], assets: &[AssetInput], covariance: &[Vec<f64>], rf: f64) -> f64 {
    let volatility = portfolio_volatility(weights, covariance);
    if volatility > 0.0 {
        (portfolio_return(weights, assets) - rf) / volatility
    } else {
        f64::MIN
    }
}

fn normalized_random<R: Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    loop {
        let mut weights: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        if normalize(&mut weights) {
            return weights;
        }
    }
}

/// Scale to sum 1; false when the vector sums to zero.
fn normalize(weights: &mut [f64]) -> bool {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return false;
    }
    for weight in weights.iter_mut() {
        *weight /= sum;
    }
    true
}

fn is_degenerate(covariance: &[Vec<f64>]) -> bool {
    covariance
        .iter()
        .enumerate()
        .all(|(i, row)| row[i] <= f64::EPSILON)
}
