//! Dashboard-facing request surface.
//!
//! Portfolio CRUD, on-demand optimization with a per-portfolio rebalance
//! lock, efficient-frontier sampling, risk analysis with threshold alerts,
//! and Kelly/position-sizing lookups. Errors distinguish bad caller input
//! ([`HubError::InvalidRequest`]) from unavailable dependencies
//! ([`HubError::Storage`]).

use crate::error::{HubError, Result};
use crate::storage::SignalStore;
use chrono::Utc;
use dashmap::DashMap;
use pulse_portfolio::{
    compute_trades, efficient_frontier, optimize, AssetInput, FrontierPoint,
    DEFAULT_MIN_TRADE_VALUE,
};
use pulse_risk::{
    analyze_drawdown, historical_var, kelly_from_returns, monte_carlo_var, parametric_var,
    position_size, DrawdownReport, KellyRecommendation, PositionSize, VarEstimate,
};
use pulse_types::{
    OptimizationStrategy, PerformanceSnapshot, Portfolio, PortfolioAsset, Rebalance, RiskAlert,
    RiskAlertKind, Severity, Timeframe, Trade,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Daily VaR above this fraction of portfolio value raises an alert.
const VAR_BREACH_THRESHOLD: f64 = 0.05;
/// Maximum drawdown above this fraction raises an alert.
const DRAWDOWN_THRESHOLD: f64 = 0.15;
/// Annualized volatility above this fraction raises an alert.
const VOLATILITY_THRESHOLD: f64 = 0.40;
/// Any single weight above this fraction raises a concentration alert.
const CONCENTRATION_THRESHOLD: f64 = 0.40;

/// History window read per asset when building optimization inputs.
const RETURN_HISTORY_BARS: usize = 253;

/// Monte-Carlo draws for the risk analysis.
const MC_SIMULATIONS: usize = 10_000;

/// Combined output of a risk-analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub historical: VarEstimate,
    pub parametric: VarEstimate,
    pub monte_carlo: VarEstimate,
    pub drawdown: DrawdownReport,
    /// Alerts raised by this analysis, already persisted.
    pub alerts: Vec<RiskAlert>,
}

pub struct DashboardService {
    store: Arc<dyn SignalStore>,
    risk_free_rate: f64,
    bar_timeframe: Timeframe,
    /// Per-portfolio rebalance mutex: two racing optimize calls for one
    /// portfolio serialize here instead of interleaving weight updates.
    rebalance_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn SignalStore>, risk_free_rate: f64, bar_timeframe: Timeframe) -> Self {
        Self {
            store,
            risk_free_rate,
            bar_timeframe,
            rebalance_locks: DashMap::new(),
        }
    }

    // ---- Portfolio CRUD -------------------------------------------------

    pub async fn create_portfolio(
        &self,
        name: &str,
        owner_id: Option<Uuid>,
        initial_capital: f64,
        strategy: OptimizationStrategy,
    ) -> Result<Portfolio> {
        if initial_capital <= 0.0 {
            return Err(HubError::invalid_request("initial capital must be positive"));
        }
        if name.trim().is_empty() {
            return Err(HubError::invalid_request("portfolio name is required"));
        }

        let portfolio = Portfolio {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            initial_capital,
            current_value: initial_capital,
            strategy,
            performance: PerformanceSnapshot::default(),
            last_rebalanced_at: None,
        };
        self.store.insert_portfolio(portfolio.clone()).await?;
        Ok(portfolio)
    }

    pub async fn portfolio(&self, id: Uuid) -> Result<Portfolio> {
        Ok(self.store.portfolio(id).await?)
    }

    pub async fn list_portfolios(&self) -> Result<Vec<Portfolio>> {
        Ok(self.store.list_portfolios().await?)
    }

    pub async fn update_portfolio(&self, portfolio: Portfolio) -> Result<()> {
        Ok(self.store.update_portfolio(portfolio).await?)
    }

    pub async fn delete_portfolio(&self, id: Uuid) -> Result<()> {
        self.rebalance_locks.remove(&id);
        Ok(self.store.delete_portfolio(id).await?)
    }

    pub async fn upsert_asset(&self, asset: PortfolioAsset) -> Result<()> {
        if asset.shares < 0.0 {
            return Err(HubError::invalid_request("share count cannot be negative"));
        }
        if asset.current_price <= 0.0 {
            return Err(HubError::invalid_request("asset price must be positive"));
        }
        // Portfolio must exist; surfaces NotFound for a bad id.
        self.store.portfolio(asset.portfolio_id).await?;
        Ok(self.store.upsert_asset(asset).await?)
    }

    pub async fn remove_asset(&self, portfolio_id: Uuid, symbol: &str) -> Result<()> {
        Ok(self.store.remove_asset(portfolio_id, symbol).await?)
    }

    pub async fn portfolio_assets(&self, portfolio_id: Uuid) -> Result<Vec<PortfolioAsset>> {
        Ok(self.store.portfolio_assets(portfolio_id).await?)
    }

    // ---- Optimization ---------------------------------------------------

    /// Run an optimization and commit it: asset weights, the portfolio row,
    /// and the append-only rebalance record are written atomically.
    /// Concurrent calls for the same portfolio serialize on a per-id lock.
    pub async fn optimize_portfolio(
        &self,
        portfolio_id: Uuid,
        strategy: OptimizationStrategy,
        seed: Option<u64>,
    ) -> Result<Rebalance> {
        let lock = self
            .rebalance_locks
            .entry(portfolio_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut portfolio = self.store.portfolio(portfolio_id).await?;
        let assets = self.store.portfolio_assets(portfolio_id).await?;
        if assets.is_empty() {
            return Err(HubError::invalid_request("portfolio has no assets"));
        }

        let inputs = self.optimization_inputs(&assets).await?;
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(|| rand::thread_rng().gen()));
        let result = optimize(&inputs, strategy, self.risk_free_rate, &mut rng)?;

        let portfolio_value = if portfolio.current_value > 0.0 {
            portfolio.current_value
        } else {
            assets.iter().map(PortfolioAsset::market_value).sum()
        };

        let previous_weights: BTreeMap<String, f64> = assets
            .iter()
            .map(|asset| (asset.symbol.clone(), asset.weight))
            .collect();
        let trades: Vec<Trade> = compute_trades(
            &assets,
            &result.weights,
            portfolio_value,
            DEFAULT_MIN_TRADE_VALUE,
        );

        let updated_assets: Vec<PortfolioAsset> = assets
            .into_iter()
            .map(|mut asset| {
                let weight = result.weights.get(&asset.symbol).copied().unwrap_or(0.0);
                asset.weight = weight;
                if asset.current_price > 0.0 {
                    asset.shares = weight * portfolio_value / asset.current_price;
                }
                asset
            })
            .collect();

        let performance = PerformanceSnapshot {
            expected_return: result.expected_return,
            sharpe_ratio: result.sharpe_ratio,
            volatility: result.volatility,
            max_drawdown: portfolio.performance.max_drawdown,
        };

        portfolio.strategy = strategy;
        portfolio.performance = performance;
        portfolio.last_rebalanced_at = Some(Utc::now());

        let rebalance = Rebalance {
            id: Uuid::new_v4(),
            portfolio_id,
            date: Utc::now(),
            strategy,
            previous_weights,
            new_weights: result.weights.clone(),
            trades,
            performance,
            reason: None,
        };

        self.store
            .commit_rebalance(portfolio, updated_assets, rebalance.clone())
            .await?;

        info!(
            "rebalanced portfolio {portfolio_id} via {:?}: sharpe {:.2}",
            strategy, result.sharpe_ratio
        );
        Ok(rebalance)
    }

    pub async fn rebalance_history(&self, portfolio_id: Uuid) -> Result<Vec<Rebalance>> {
        Ok(self.store.rebalance_history(portfolio_id).await?)
    }

    pub async fn frontier(
        &self,
        portfolio_id: Uuid,
        n_points: usize,
        samples: usize,
        seed: Option<u64>,
    ) -> Result<Vec<FrontierPoint>> {
        let assets = self.store.portfolio_assets(portfolio_id).await?;
        if assets.is_empty() {
            return Err(HubError::invalid_request("portfolio has no assets"));
        }
        let inputs = self.optimization_inputs(&assets).await?;
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(|| rand::thread_rng().gen()));
        Ok(efficient_frontier(
            &inputs,
            n_points,
            samples,
            self.risk_free_rate,
            &mut rng,
        )?)
    }

    // ---- Risk -----------------------------------------------------------

    /// VaR (all three estimators), drawdown, and threshold checks for a
    /// portfolio. Any threshold breach persists a [`RiskAlert`].
    pub async fn risk_analysis(
        &self,
        portfolio_id: Uuid,
        confidence: f64,
        seed: Option<u64>,
    ) -> Result<RiskReport> {
        if !(0.0..1.0).contains(&confidence) {
            return Err(HubError::invalid_request("confidence must be in (0, 1)"));
        }

        let portfolio = self.store.portfolio(portfolio_id).await?;
        let assets = self.store.portfolio_assets(portfolio_id).await?;
        if assets.is_empty() {
            return Err(HubError::invalid_request("portfolio has no assets"));
        }

        let returns = self.weighted_portfolio_returns(&assets).await?;
        let value = portfolio.current_value;

        let historical = historical_var(&returns, confidence, value);

        let (mean, std_dev) = mean_and_std(&returns);
        let parametric = parametric_var(mean, std_dev, confidence, value, 1);

        let mut rng = StdRng::seed_from_u64(seed.unwrap_or_else(|| rand::thread_rng().gen()));
        let monte_carlo =
            monte_carlo_var(mean, std_dev, value, MC_SIMULATIONS, confidence, &mut rng);

        // Reconstruct the equity curve from returns for drawdown tracking.
        let mut equity = Vec::with_capacity(returns.len() + 1);
        let mut level = value;
        equity.push(level);
        for r in &returns {
            level *= 1.0 + r;
            equity.push(level);
        }
        let drawdown = analyze_drawdown(&equity);

        let annualized_vol = std_dev * (252.0f64).sqrt();
        let mut alerts = Vec::new();

        if value > 0.0 && historical.var / value > VAR_BREACH_THRESHOLD {
            alerts.push(RiskAlert::new(
                portfolio_id,
                RiskAlertKind::VarBreach,
                Severity::High,
                format!(
                    "daily VaR {:.1}% of portfolio value exceeds {:.0}% limit",
                    100.0 * historical.var / value,
                    100.0 * VAR_BREACH_THRESHOLD
                ),
                VAR_BREACH_THRESHOLD,
                historical.var / value,
            ));
        }
        if drawdown.max_drawdown > DRAWDOWN_THRESHOLD {
            let severity = if drawdown.max_drawdown > 2.0 * DRAWDOWN_THRESHOLD {
                Severity::Critical
            } else {
                Severity::High
            };
            alerts.push(RiskAlert::new(
                portfolio_id,
                RiskAlertKind::Drawdown,
                severity,
                format!(
                    "max drawdown {:.1}% exceeds {:.0}% limit",
                    100.0 * drawdown.max_drawdown,
                    100.0 * DRAWDOWN_THRESHOLD
                ),
                DRAWDOWN_THRESHOLD,
                drawdown.max_drawdown,
            ));
        }
        if annualized_vol > VOLATILITY_THRESHOLD {
            alerts.push(RiskAlert::new(
                portfolio_id,
                RiskAlertKind::Volatility,
                Severity::Medium,
                format!(
                    "annualized volatility {:.1}% exceeds {:.0}% limit",
                    100.0 * annualized_vol,
                    100.0 * VOLATILITY_THRESHOLD
                ),
                VOLATILITY_THRESHOLD,
                annualized_vol,
            ));
        }
        for asset in &assets {
            if asset.weight > CONCENTRATION_THRESHOLD {
                alerts.push(RiskAlert::new(
                    portfolio_id,
                    RiskAlertKind::Concentration,
                    Severity::Medium,
                    format!(
                        "{} holds {:.1}% of the portfolio, above the {:.0}% limit",
                        asset.symbol,
                        100.0 * asset.weight,
                        100.0 * CONCENTRATION_THRESHOLD
                    ),
                    CONCENTRATION_THRESHOLD,
                    asset.weight,
                ));
            }
        }

        for alert in &alerts {
            self.store.insert_alert(alert.clone()).await?;
        }

        Ok(RiskReport {
            historical,
            parametric,
            monte_carlo,
            drawdown,
            alerts,
        })
    }

    pub async fn alerts(&self, portfolio_id: Uuid) -> Result<Vec<RiskAlert>> {
        Ok(self.store.alerts(portfolio_id).await?)
    }

    pub async fn acknowledge_alert(&self, id: Uuid) -> Result<()> {
        Ok(self.store.acknowledge_alert(id).await?)
    }

    /// Kelly sizing from a symbol's completed-trade history. Fewer than ten
    /// samples yields the neutral insufficient-data recommendation.
    pub async fn kelly_for_symbol(
        &self,
        symbol: &str,
        max_allocation: f64,
    ) -> Result<KellyRecommendation> {
        if !(0.0..=1.0).contains(&max_allocation) {
            return Err(HubError::invalid_request("max allocation must be in [0, 1]"));
        }
        let returns = self.store.trade_returns(symbol).await?;
        Ok(kelly_from_returns(&returns, max_allocation))
    }

    pub fn position_sizing(
        &self,
        account_size: f64,
        risk_pct: f64,
        entry: f64,
        stop: f64,
    ) -> Result<PositionSize> {
        Ok(position_size(account_size, risk_pct, entry, stop)?)
    }

    // ---- helpers --------------------------------------------------------

    async fn optimization_inputs(&self, assets: &[PortfolioAsset]) -> Result<Vec<AssetInput>> {
        let mut inputs = Vec::with_capacity(assets.len());
        for asset in assets {
            let bars = self
                .store
                .price_bars(&asset.symbol, self.bar_timeframe, RETURN_HISTORY_BARS)
                .await?;
            let returns = daily_returns(&bars.iter().map(|b| b.close).collect::<Vec<_>>());
            inputs.push(
                AssetInput::new(&asset.symbol, asset.expected_return, asset.volatility)
                    .with_history(returns),
            );
        }
        Ok(inputs)
    }

    /// Weight-blended daily returns over the shortest common history.
    async fn weighted_portfolio_returns(&self, assets: &[PortfolioAsset]) -> Result<Vec<f64>> {
        let mut series = Vec::with_capacity(assets.len());
        for asset in assets {
            let bars = self
                .store
                .price_bars(&asset.symbol, self.bar_timeframe, RETURN_HISTORY_BARS)
                .await?;
            let returns = daily_returns(&bars.iter().map(|b| b.close).collect::<Vec<_>>());
            series.push((asset.weight, returns));
        }

        let overlap = series
            .iter()
            .map(|(_, returns)| returns.len())
            .min()
            .unwrap_or(0);
        if overlap == 0 {
            return Ok(Vec::new());
        }

        let mut blended = vec![0.0; overlap];
        for (weight, returns) in &series {
            let tail = &returns[returns.len() - overlap..];
            for (i, r) in tail.iter().enumerate() {
                blended[i] += weight * r;
            }
        }
        Ok(blended)
    }
}

fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect()
}

fn mean_and_std(returns: &[f64]) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<f64>()
        / (returns.len() - 1) as f64;
    (mean, variance.sqrt())
}
