//! Annualized sample covariance over historical return series.

use crate::{AssetInput, TRADING_DAYS_PER_YEAR};

/// Pairwise sample covariance matrix, Bessel-corrected (n - 1 denominator)
/// and annualized by the trading-day count.
///
/// Pairs are computed over the overlapping tail of the two histories. A
/// diagonal cell with fewer than two observations falls back to the asset's
/// quoted volatility squared; an off-diagonal cell with insufficient overlap
/// is zero (no evidence of co-movement).
pub fn covariance_matrix(assets: &[AssetInput]) -> Vec<Vec<f64>> {
    let n = assets.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in i..n {
            let cell = match pair_covariance(
                &assets[i].historical_returns,
                &assets[j].historical_returns,
            ) {
                Some(covariance) => covariance * TRADING_DAYS_PER_YEAR,
                None if i == j => assets[i].volatility * assets[i].volatility,
                None => 0.0,
            };
            matrix[i][j] = cell;
            matrix[j][i] = cell;
        }
    }

    matrix
}

/// Sample covariance over the overlapping tail of two series, or None when
/// fewer than two overlapping observations exist.
fn pair_covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let overlap = xs.len().min(ys.len());
    if overlap < 2 {
        return None;
    }

    let xs = &xs[xs.len() - overlap..];
    let ys = &ys[ys.len() - overlap..];

    let mean_x = xs.iter().sum::<f64>() / overlap as f64;
    let mean_y = ys.iter().sum::<f64>() / overlap as f64;

    let cross_sum: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    Some(cross_sum / (overlap - 1) as f64)
}

/// Weighted expected return of the basket.
pub fn portfolio_return(weights: &[f64], assets: &[AssetInput]) -> f64 {
    weights
        .iter()
        .zip(assets)
        .map(|(w, asset)| w * asset.expected_return)
        .sum()
}

/// Portfolio volatility `sqrt(wᵀ Σ w)` for a weight vector.
pub fn portfolio_volatility(weights: &[f64], covariance: &[Vec<f64>]) -> f64 {
    let mut variance = 0.0;
    for (i, wi) in weights.iter().enumerate() {
        for (j, wj) in weights.iter().enumerate() {
            variance += wi * wj * covariance[i][j];
        }
    }
    variance.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_matches_sample_variance() {
        let asset = AssetInput::new("AAPL", 0.1, 0.2)
            .with_history(vec![0.01, -0.02, 0.015, 0.005, -0.01]);
        let matrix = covariance_matrix(&[asset.clone()]);

        let mean = asset.historical_returns.iter().sum::<f64>() / 5.0;
        let variance: f64 = asset
            .historical_returns
            .iter()
            .map(|r| (r - mean) * (r - mean))
            .sum::<f64>()
            / 4.0;
        assert!((matrix[0][0] - variance * TRADING_DAYS_PER_YEAR).abs() < 1e-12);
    }

    #[test]
    fn missing_history_falls_back_to_quoted_volatility() {
        let matrix = covariance_matrix(&[
            AssetInput::new("AAPL", 0.1, 0.2),
            AssetInput::new("MSFT", 0.1, 0.3),
        ]);
        assert!((matrix[0][0] - 0.04).abs() < 1e-12);
        assert!((matrix[1][1] - 0.09).abs() < 1e-12);
        assert_eq!(matrix[0][1], 0.0);
    }

    #[test]
    fn perfectly_correlated_series() {
        let history = vec![0.01, -0.01, 0.02, -0.02, 0.015];
        let a = AssetInput::new("A", 0.1, 0.2).with_history(history.clone());
        let b = AssetInput::new("B", 0.1, 0.2).with_history(history);
        let matrix = covariance_matrix(&[a, b]);
        assert!((matrix[0][1] - matrix[0][0]).abs() < 1e-12);
        assert!((matrix[0][1] - matrix[1][0]).abs() < 1e-12);
    }

    #[test]
    fn volatility_of_single_asset_is_its_sigma() {
        let covariance = vec![vec![0.04]];
        let vol = portfolio_volatility(&[1.0], &covariance);
        assert!((vol - 0.2).abs() < 1e-12);
    }
}
