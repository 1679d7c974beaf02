//! Trade-delta computation for committing an optimization result.

use pulse_types::{PortfolioAsset, Trade, TradeAction};
use std::collections::BTreeMap;

/// Trades below this dollar value are dropped as noise.
pub const DEFAULT_MIN_TRADE_VALUE: f64 = 10.0;

/// Buy/sell deltas needed to move each holding to its target weight.
///
/// Symbols present only in the target map are bought from zero; holdings
/// absent from the target map are sold down to zero. Trades under
/// `min_trade_value` dollars are filtered out.
pub fn compute_trades(
    assets: &[PortfolioAsset],
    target_weights: &BTreeMap<String, f64>,
    portfolio_value: f64,
    min_trade_value: f64,
) -> Vec<Trade> {
    let prices: BTreeMap<&str, f64> = assets
        .iter()
        .map(|asset| (asset.symbol.as_str(), asset.current_price))
        .collect();
    let current_values: BTreeMap<&str, f64> = assets
        .iter()
        .map(|asset| (asset.symbol.as_str(), asset.market_value()))
        .collect();

    let mut symbols: Vec<&str> = current_values.keys().copied().collect();
    for symbol in target_weights.keys() {
        if !current_values.contains_key(symbol.as_str()) {
            symbols.push(symbol);
        }
    }

    let mut trades = Vec::new();
    for symbol in symbols {
        let current = current_values.get(symbol).copied().unwrap_or(0.0);
        let target = target_weights.get(symbol).copied().unwrap_or(0.0) * portfolio_value;
        let delta = target - current;
        if delta.abs() < min_trade_value {
            continue;
        }

        let price = prices.get(symbol).copied().unwrap_or(0.0);
        let shares = if price > 0.0 { delta.abs() / price } else { 0.0 };

        trades.push(Trade {
            symbol: symbol.to_string(),
            action: if delta > 0.0 {
                TradeAction::Buy
            } else {
                TradeAction::Sell
            },
            shares,
            value: delta.abs(),
        });
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn asset(symbol: &str, shares: f64, price: f64) -> PortfolioAsset {
        PortfolioAsset {
            portfolio_id: Uuid::nil(),
            symbol: symbol.to_string(),
            shares,
            weight: 0.0,
            cost_basis: None,
            current_price: price,
            expected_return: 0.1,
            volatility: 0.2,
        }
    }

    #[test]
    fn deltas_toward_target_weights() {
        // 10k portfolio: AAPL holds 6k, SPY 4k; target is 50/50.
        let assets = vec![asset("AAPL", 30.0, 200.0), asset("SPY", 10.0, 400.0)];
        let targets = BTreeMap::from([("AAPL".to_string(), 0.5), ("SPY".to_string(), 0.5)]);

        let trades = compute_trades(&assets, &targets, 10_000.0, DEFAULT_MIN_TRADE_VALUE);
        assert_eq!(trades.len(), 2);

        let sell = trades.iter().find(|t| t.symbol == "AAPL").unwrap();
        assert_eq!(sell.action, TradeAction::Sell);
        assert!((sell.value - 1_000.0).abs() < 1e-9);
        assert!((sell.shares - 5.0).abs() < 1e-9);

        let buy = trades.iter().find(|t| t.symbol == "SPY").unwrap();
        assert_eq!(buy.action, TradeAction::Buy);
        assert!((buy.value - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn small_deltas_are_filtered() {
        let assets = vec![asset("AAPL", 25.0, 200.0), asset("SPY", 12.5, 400.0)];
        let targets = BTreeMap::from([("AAPL".to_string(), 0.5), ("SPY".to_string(), 0.5)]);
        let trades = compute_trades(&assets, &targets, 10_000.0, DEFAULT_MIN_TRADE_VALUE);
        assert!(trades.is_empty());
    }

    #[test]
    fn dropped_symbol_is_sold_to_zero() {
        let assets = vec![asset("AAPL", 30.0, 200.0), asset("OLD", 10.0, 100.0)];
        let targets = BTreeMap::from([("AAPL".to_string(), 1.0)]);
        let trades = compute_trades(&assets, &targets, 7_000.0, DEFAULT_MIN_TRADE_VALUE);

        let sell = trades.iter().find(|t| t.symbol == "OLD").unwrap();
        assert_eq!(sell.action, TradeAction::Sell);
        assert!((sell.value - 1_000.0).abs() < 1e-9);
        assert!((sell.shares - 10.0).abs() < 1e-9);
    }

    #[test]
    fn new_symbol_is_bought_from_zero() {
        let assets = vec![asset("AAPL", 30.0, 200.0)];
        let targets = BTreeMap::from([("AAPL".to_string(), 0.8), ("NEW".to_string(), 0.2)]);
        let trades = compute_trades(&assets, &targets, 7_500.0, DEFAULT_MIN_TRADE_VALUE);

        let buy = trades.iter().find(|t| t.symbol == "NEW").unwrap();
        assert_eq!(buy.action, TradeAction::Buy);
        assert!((buy.value - 1_500.0).abs() < 1e-9);
        // No price reference for a brand-new symbol: value only.
        assert_eq!(buy.shares, 0.0);
    }
}
