//! Persistence boundary.
//!
//! The relational store is the system of record for signals, portfolios,
//! rebalances, and risk alerts; this module defines the trait the hub
//! speaks and an in-process [`MemoryStore`] used by the default binary
//! wiring and the test suite. A relational implementation plugs in behind
//! the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pulse_types::{Portfolio, PortfolioAsset, PriceBar, Rebalance, RiskAlert, Signal, Timeframe};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {entity}")]
    NotFound { entity: String },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD surface the hub needs from the system of record.
///
/// `commit_rebalance` is the one multi-row operation and must be atomic per
/// portfolio: either the portfolio row, every asset weight, and the
/// rebalance record are written, or none are.
#[async_trait]
pub trait SignalStore: Send + Sync {
    // Signals
    async fn insert_signal(&self, signal: Signal) -> StoreResult<()>;
    /// Most recent signals, descending by creation time.
    async fn recent_signals(&self, limit: usize) -> StoreResult<Vec<Signal>>;
    async fn set_signal_notified(&self, id: Uuid) -> StoreResult<()>;
    /// Flip `is_active` off for signals past their expiry. Returns how many
    /// were deactivated.
    async fn deactivate_expired_signals(&self, now: DateTime<Utc>) -> StoreResult<usize>;

    // Market data
    /// Bars ascending by timestamp, at most `limit` of the most recent.
    async fn price_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> StoreResult<Vec<PriceBar>>;
    async fn insert_price_bars(&self, symbol: &str, bars: Vec<PriceBar>) -> StoreResult<()>;

    // Portfolios
    async fn insert_portfolio(&self, portfolio: Portfolio) -> StoreResult<()>;
    async fn portfolio(&self, id: Uuid) -> StoreResult<Portfolio>;
    async fn list_portfolios(&self) -> StoreResult<Vec<Portfolio>>;
    async fn update_portfolio(&self, portfolio: Portfolio) -> StoreResult<()>;
    async fn delete_portfolio(&self, id: Uuid) -> StoreResult<()>;

    async fn upsert_asset(&self, asset: PortfolioAsset) -> StoreResult<()>;
    async fn remove_asset(&self, portfolio_id: Uuid, symbol: &str) -> StoreResult<()>;
    async fn portfolio_assets(&self, portfolio_id: Uuid) -> StoreResult<Vec<PortfolioAsset>>;

    /// Atomically persist the updated portfolio row, the full replacement
    /// asset set, and the append-only rebalance record.
    async fn commit_rebalance(
        &self,
        portfolio: Portfolio,
        assets: Vec<PortfolioAsset>,
        rebalance: Rebalance,
    ) -> StoreResult<()>;
    /// Rebalance history, most recent first.
    async fn rebalance_history(&self, portfolio_id: Uuid) -> StoreResult<Vec<Rebalance>>;

    // Risk alerts
    async fn insert_alert(&self, alert: RiskAlert) -> StoreResult<()>;
    async fn alerts(&self, portfolio_id: Uuid) -> StoreResult<Vec<RiskAlert>>;
    async fn acknowledge_alert(&self, id: Uuid) -> StoreResult<()>;

    // Prediction history
    /// Completed-trade returns for a symbol, used for Kelly statistics.
    async fn trade_returns(&self, symbol: &str) -> StoreResult<Vec<f64>>;
    async fn record_trade_return(&self, symbol: &str, trade_return: f64) -> StoreResult<()>;
}

/// In-process store. Every map sits behind its own lock; the rebalance
/// commit takes all three relevant locks inside one scope so readers never
/// observe a half-applied rebalance.
#[derive(Default)]
pub struct MemoryStore {
    signals: RwLock<Vec<Signal>>,
    bars: RwLock<HashMap<(String, Timeframe), Vec<PriceBar>>>,
    portfolios: RwLock<HashMap<Uuid, Portfolio>>,
    assets: RwLock<HashMap<Uuid, Vec<PortfolioAsset>>>,
    rebalances: RwLock<Vec<Rebalance>>,
    alerts: RwLock<Vec<RiskAlert>>,
    trade_returns: RwLock<HashMap<String, Vec<f64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn insert_signal(&self, signal: Signal) -> StoreResult<()> {
        self.signals.write().push(signal);
        Ok(())
    }

    async fn recent_signals(&self, limit: usize) -> StoreResult<Vec<Signal>> {
        let signals = self.signals.read();
        let mut sorted: Vec<Signal> = signals.clone();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted.truncate(limit);
        Ok(sorted)
    }

    async fn set_signal_notified(&self, id: Uuid) -> StoreResult<()> {
        let mut signals = self.signals.write();
        match signals.iter_mut().find(|s| s.id == id) {
            Some(signal) => {
                signal.notified = true;
                Ok(())
            }
            None => Err(StoreError::not_found(format!("signal {id}"))),
        }
    }

    async fn deactivate_expired_signals(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut signals = self.signals.write();
        let mut deactivated = 0;
        for signal in signals.iter_mut() {
            if signal.is_active && signal.is_expired(now) {
                signal.is_active = false;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }

    async fn price_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> StoreResult<Vec<PriceBar>> {
        let bars = self.bars.read();
        let series = bars
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .unwrap_or_default();
        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }

    async fn insert_price_bars(&self, symbol: &str, new_bars: Vec<PriceBar>) -> StoreResult<()> {
        let mut bars = self.bars.write();
        for bar in new_bars {
            let series = bars.entry((symbol.to_string(), bar.timeframe)).or_default();
            series.push(bar);
            series.sort_by_key(|b| b.timestamp);
        }
        Ok(())
    }

    async fn insert_portfolio(&self, portfolio: Portfolio) -> StoreResult<()> {
        self.portfolios.write().insert(portfolio.id, portfolio);
        Ok(())
    }

    async fn portfolio(&self, id: Uuid) -> StoreResult<Portfolio> {
        self.portfolios
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("portfolio {id}")))
    }

    async fn list_portfolios(&self) -> StoreResult<Vec<Portfolio>> {
        Ok(self.portfolios.read().values().cloned().collect())
    }

    async fn update_portfolio(&self, portfolio: Portfolio) -> StoreResult<()> {
        let mut portfolios = self.portfolios.write();
        if !portfolios.contains_key(&portfolio.id) {
            return Err(StoreError::not_found(format!("portfolio {}", portfolio.id)));
        }
        portfolios.insert(portfolio.id, portfolio);
        Ok(())
    }

    async fn delete_portfolio(&self, id: Uuid) -> StoreResult<()> {
        self.portfolios
            .write()
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(format!("portfolio {id}")))?;
        self.assets.write().remove(&id);
        Ok(())
    }

    async fn upsert_asset(&self, asset: PortfolioAsset) -> StoreResult<()> {
        let mut assets = self.assets.write();
        let rows = assets.entry(asset.portfolio_id).or_default();
        match rows.iter_mut().find(|row| row.symbol == asset.symbol) {
            Some(existing) => *existing = asset,
            None => rows.push(asset),
        }
        Ok(())
    }

    async fn remove_asset(&self, portfolio_id: Uuid, symbol: &str) -> StoreResult<()> {
        let mut assets = self.assets.write();
        let rows = assets
            .get_mut(&portfolio_id)
            .ok_or_else(|| StoreError::not_found(format!("portfolio {portfolio_id}")))?;
        let before = rows.len();
        rows.retain(|row| row.symbol != symbol);
        if rows.len() == before {
            return Err(StoreError::not_found(format!("asset {symbol}")));
        }
        Ok(())
    }

    async fn portfolio_assets(&self, portfolio_id: Uuid) -> StoreResult<Vec<PortfolioAsset>> {
        Ok(self
            .assets
            .read()
            .get(&portfolio_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit_rebalance(
        &self,
        portfolio: Portfolio,
        assets: Vec<PortfolioAsset>,
        rebalance: Rebalance,
    ) -> StoreResult<()> {
        // All three locks held for the duration of the write: no reader
        // sees new weights without the matching rebalance record.
        let mut portfolios = self.portfolios.write();
        let mut asset_map = self.assets.write();
        let mut rebalances = self.rebalances.write();

        if !portfolios.contains_key(&portfolio.id) {
            return Err(StoreError::not_found(format!("portfolio {}", portfolio.id)));
        }
        asset_map.insert(portfolio.id, assets);
        portfolios.insert(portfolio.id, portfolio);
        rebalances.push(rebalance);
        Ok(())
    }

    async fn rebalance_history(&self, portfolio_id: Uuid) -> StoreResult<Vec<Rebalance>> {
        let mut history: Vec<Rebalance> = self
            .rebalances
            .read()
            .iter()
            .filter(|r| r.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(history)
    }

    async fn insert_alert(&self, alert: RiskAlert) -> StoreResult<()> {
        self.alerts.write().push(alert);
        Ok(())
    }

    async fn alerts(&self, portfolio_id: Uuid) -> StoreResult<Vec<RiskAlert>> {
        Ok(self
            .alerts
            .read()
            .iter()
            .filter(|a| a.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    async fn acknowledge_alert(&self, id: Uuid) -> StoreResult<()> {
        let mut alerts = self.alerts.write();
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                Ok(())
            }
            None => Err(StoreError::not_found(format!("alert {id}"))),
        }
    }

    async fn trade_returns(&self, symbol: &str) -> StoreResult<Vec<f64>> {
        Ok(self
            .trade_returns
            .read()
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_trade_return(&self, symbol: &str, trade_return: f64) -> StoreResult<()> {
        self.trade_returns
            .write()
            .entry(symbol.to_string())
            .or_default()
            .push(trade_return);
        Ok(())
    }
}
