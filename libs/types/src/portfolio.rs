//! Portfolio aggregate, asset holdings, and the rebalance audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Optimization strategy applied to a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStrategy {
    #[default]
    Markowitz,
    RiskParity,
    EqualWeight,
}

/// Point-in-time performance figures for a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceSnapshot {
    pub expected_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub volatility: f64,
}

/// A user portfolio. Owns a set of [`PortfolioAsset`] rows keyed by
/// `portfolio_id` in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub initial_capital: f64,
    pub current_value: f64,
    pub strategy: OptimizationStrategy,
    pub performance: PerformanceSnapshot,
    pub last_rebalanced_at: Option<DateTime<Utc>>,
}

/// A single holding inside a portfolio.
///
/// The sum of `weight` across a portfolio's assets equals 1 (within floating
/// tolerance) after any optimization call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub portfolio_id: Uuid,
    pub symbol: String,
    pub shares: f64,
    pub weight: f64,
    pub cost_basis: Option<f64>,
    pub current_price: f64,
    pub expected_return: f64,
    pub volatility: f64,
}

impl PortfolioAsset {
    pub fn market_value(&self) -> f64 {
        self.shares * self.current_price
    }
}

/// Buy or sell side of a rebalance trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// One trade needed to move a holding to its target weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub action: TradeAction,
    pub shares: f64,
    pub value: f64,
}

/// Append-only audit record of one optimization commit. Never mutated
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rebalance {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub date: DateTime<Utc>,
    pub strategy: OptimizationStrategy,
    pub previous_weights: BTreeMap<String, f64>,
    pub new_weights: BTreeMap<String, f64>,
    pub trades: Vec<Trade>,
    pub performance: PerformanceSnapshot,
    pub reason: Option<String>,
}
