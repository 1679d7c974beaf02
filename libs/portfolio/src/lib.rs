//! # Portfolio Optimizer
//!
//! Pure functions over a basket of assets' expected returns and covariances:
//! stochastic mean-variance (max-Sharpe) search, risk-parity iteration,
//! equal weighting, efficient-frontier sampling, and rebalance trade
//! computation.
//!
//! The Markowitz search and frontier sampler are anytime heuristics driven
//! by an injected random source: repeated random weight draws plus local
//! refinement, not an exact quadratic-program solve. That trade-off is
//! deliberate: the caller only needs to beat equal weighting inside a
//! bounded latency budget, and a seeded [`rand::Rng`] makes every run
//! reproducible under test.

pub mod covariance;
pub mod error;
pub mod frontier;
pub mod optimizer;
pub mod rebalance;

pub use covariance::{covariance_matrix, portfolio_return, portfolio_volatility};
pub use error::{PortfolioError, Result};
pub use frontier::{efficient_frontier, FrontierPoint};
pub use optimizer::{
    equal_weight, max_sharpe, optimize, risk_parity, OptimizationResult, SearchParams,
};
pub use rebalance::{compute_trades, DEFAULT_MIN_TRADE_VALUE};

use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize sample covariance.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One asset in the optimization basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInput {
    pub symbol: String,
    /// Annualized expected return.
    pub expected_return: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Daily return history, most recent last. May be empty; the covariance
    /// builder then falls back to the quoted volatility.
    pub historical_returns: Vec<f64>,
}

impl AssetInput {
    pub fn new(symbol: impl Into<String>, expected_return: f64, volatility: f64) -> Self {
        Self {
            symbol: symbol.into(),
            expected_return,
            volatility,
            historical_returns: Vec::new(),
        }
    }

    pub fn with_history(mut self, returns: Vec<f64>) -> Self {
        self.historical_returns = returns;
        self
    }
}
