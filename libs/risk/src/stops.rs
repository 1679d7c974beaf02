//! ATR-based and trailing stop placement.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Synthetic high/low band applied when only closes are available.
const RANGE_PROXY_PCT: f64 = 0.01;

/// Flat stop distance used when the series is too short for an ATR.
const FALLBACK_STOP_PCT: f64 = 0.02;

/// Flat target distance used when the series is too short for an ATR.
const FALLBACK_TARGET_PCT: f64 = 0.10;

/// Reward multiple applied on top of the stop distance.
const TARGET_REWARD_RATIO: f64 = 1.5;

/// How the stop/target pair was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMethod {
    Atr,
    PercentFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopTarget {
    pub stop: f64,
    pub target: f64,
    pub atr: f64,
    pub method: StopMethod,
}

/// ATR stop/target off the last close.
///
/// True range per bar is synthesized from closes with a fixed ±1% high/low
/// proxy: `max(high - low, |high - prev_close|, |low - prev_close|)`. The
/// ATR is the mean of the last `period` true ranges; the stop sits
/// `atr * multiplier` below the close and the target 1.5 times that distance
/// above. Below `period + 1` closes the function falls back to a flat
/// 2% stop / 10% target.
pub fn atr_stop_target(closes: &[f64], period: usize, multiplier: f64) -> Result<StopTarget> {
    let last = *closes
        .last()
        .ok_or_else(|| RiskError::invalid_input("price series is empty"))?;
    if last <= 0.0 {
        return Err(RiskError::invalid_input("last close must be positive"));
    }
    if period == 0 {
        return Err(RiskError::invalid_input("ATR period must be at least 1"));
    }

    if closes.len() < period + 1 {
        return Ok(StopTarget {
            stop: last * (1.0 - FALLBACK_STOP_PCT),
            target: last * (1.0 + FALLBACK_TARGET_PCT),
            atr: 0.0,
            method: StopMethod::PercentFallback,
        });
    }

    let mut true_ranges = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let (prev_close, close) = (pair[0], pair[1]);
        let high = close * (1.0 + RANGE_PROXY_PCT);
        let low = close * (1.0 - RANGE_PROXY_PCT);
        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        true_ranges.push(tr);
    }

    let window = &true_ranges[true_ranges.len() - period..];
    let atr = window.iter().sum::<f64>() / period as f64;

    Ok(StopTarget {
        stop: last - atr * multiplier,
        target: last + atr * multiplier * TARGET_REWARD_RATIO,
        atr,
        method: StopMethod::Atr,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    pub stop_price: f64,
    pub triggered: bool,
}

/// Trailing stop off the highest price seen since entry.
pub fn trailing_stop(
    _entry: f64,
    current: f64,
    highest_seen: f64,
    trailing_pct: f64,
) -> TrailingStop {
    let stop_price = highest_seen * (1.0 - trailing_pct);
    TrailingStop {
        stop_price,
        triggered: current <= stop_price,
    }
}
