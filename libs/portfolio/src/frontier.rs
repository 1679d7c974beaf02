//! Efficient-frontier sampling.

use crate::covariance::{covariance_matrix, portfolio_return, portfolio_volatility};
use crate::error::{PortfolioError, Result};
use crate::AssetInput;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One frontier point: the lowest-volatility weight vector found near its
/// return target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub weights: BTreeMap<String, f64>,
}

/// Sample the efficient frontier.
///
/// Return targets span `[min, max]` expected return across the basket. Each
/// random weight vector is assigned to the nearest target within half a
/// bucket width; per bucket only the lowest-volatility vector survives. The
/// result is sorted by volatility ascending.
pub fn efficient_frontier<R: Rng>(
    assets: &[AssetInput],
    n_points: usize,
    samples: usize,
    risk_free_rate: f64,
    rng: &mut R,
) -> Result<Vec<FrontierPoint>> {
    if assets.is_empty() {
        return Err(PortfolioError::EmptyBasket);
    }
    if n_points == 0 {
        return Err(PortfolioError::invalid_input("n_points must be at least 1"));
    }

    let covariance = covariance_matrix(assets);
    let min_return = assets
        .iter()
        .map(|a| a.expected_return)
        .fold(f64::INFINITY, f64::min);
    let max_return = assets
        .iter()
        .map(|a| a.expected_return)
        .fold(f64::NEG_INFINITY, f64::max);

    let span = max_return - min_return;
    let step = if n_points > 1 { span / (n_points - 1) as f64 } else { 0.0 };
    let tolerance = if step > 0.0 { step / 2.0 } else { span.abs().max(1e-9) };

    // Best (volatility, weights, return) per target bucket.
    let mut best: Vec<Option<(f64, Vec<f64>, f64)>> = vec![None; n_points];

    let n = assets.len();
    for _ in 0..samples {
        let mut weights: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            continue;
        }
        for weight in weights.iter_mut() {
            *weight /= sum;
        }

        let expected = portfolio_return(&weights, assets);
        let bucket = if step > 0.0 {
            ((expected - min_return) / step).round() as isize
        } else {
            0
        };
        if bucket < 0 || bucket as usize >= n_points {
            continue;
        }
        let bucket = bucket as usize;
        let target = min_return + step * bucket as f64;
        if (expected - target).abs() > tolerance {
            continue;
        }

        let volatility = portfolio_volatility(&weights, &covariance);
        let better = match &best[bucket] {
            Some((existing, _, _)) => volatility < *existing,
            None => true,
        };
        if better {
            best[bucket] = Some((volatility, weights, expected));
        }
    }

    let mut points: Vec<FrontierPoint> = best
        .into_iter()
        .flatten()
        .map(|(volatility, weights, expected_return)| FrontierPoint {
            expected_return,
            volatility,
            sharpe_ratio: if volatility > 0.0 {
                (expected_return - risk_free_rate) / volatility
            } else {
                0.0
            },
            weights: assets
                .iter()
                .zip(weights)
                .map(|(asset, weight)| (asset.symbol.clone(), weight))
                .collect(),
        })
        .collect();

    points.sort_by(|a, b| {
        a.volatility
            .partial_cmp(&b.volatility)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn basket() -> Vec<AssetInput> {
        vec![
            AssetInput::new("AAPL", 0.12, 0.25),
            AssetInput::new("MSFT", 0.10, 0.20),
            AssetInput::new("SPY", 0.08, 0.15),
        ]
    }

    #[test]
    fn frontier_is_sorted_by_volatility() {
        let mut rng = StdRng::seed_from_u64(5);
        let points = efficient_frontier(&basket(), 10, 5_000, 0.02, &mut rng).unwrap();
        assert!(!points.is_empty());
        for pair in points.windows(2) {
            assert!(pair[0].volatility <= pair[1].volatility);
        }
    }

    #[test]
    fn frontier_weights_are_normalized() {
        let mut rng = StdRng::seed_from_u64(5);
        let points = efficient_frontier(&basket(), 10, 5_000, 0.02, &mut rng).unwrap();
        for point in &points {
            let sum: f64 = point.weights.values().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn frontier_returns_stay_in_basket_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let points = efficient_frontier(&basket(), 10, 5_000, 0.02, &mut rng).unwrap();
        for point in &points {
            assert!(point.expected_return >= 0.08 - 1e-9);
            assert!(point.expected_return <= 0.12 + 1e-9);
        }
    }

    #[test]
    fn identical_returns_collapse_to_one_bucket() {
        let assets = vec![
            AssetInput::new("A", 0.10, 0.20),
            AssetInput::new("B", 0.10, 0.30),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let points = efficient_frontier(&assets, 5, 2_000, 0.02, &mut rng).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn empty_basket_is_an_error() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(efficient_frontier(&[], 10, 100, 0.02, &mut rng).is_err());
    }
}
