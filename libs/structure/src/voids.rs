//! Liquidity-void detection.

use chrono::Utc;
use pulse_types::{LiquidityVoid, MagnetStrength, PriceBar, Timeframe};

/// Minimum close-to-close move, as a fraction of the prior close.
const MIN_MOVE_PCT: f64 = 0.005;

/// Volume below this fraction of the window mean marks the move as thin.
const THIN_VOLUME_RATIO: f64 = 0.5;

const STRONG_MAGNET_PCT: f64 = 0.02;
const MEDIUM_MAGNET_PCT: f64 = 0.01;

/// Find price moves made on abnormally low volume.
///
/// A void is emitted for an adjacent bar pair when the close-to-close move
/// exceeds 0.5% while the second bar's volume is under half the mean volume
/// of the full input window. The void spans the union of the two bars'
/// high/low range.
pub fn detect_liquidity_voids(
    symbol: &str,
    timeframe: Timeframe,
    bars: &[PriceBar],
) -> Vec<LiquidityVoid> {
    let mut voids = Vec::new();
    if bars.len() < 2 {
        return voids;
    }

    let mean_volume = bars.iter().map(|bar| bar.volume).sum::<f64>() / bars.len() as f64;
    if mean_volume <= 0.0 {
        return voids;
    }

    for pair in bars.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        if prev.close <= 0.0 {
            continue;
        }

        let move_pct = (current.close - prev.close).abs() / prev.close;
        if move_pct <= MIN_MOVE_PCT || current.volume >= THIN_VOLUME_RATIO * mean_volume {
            continue;
        }

        let void_top = prev.high.max(current.high);
        let void_bottom = prev.low.min(current.low);

        voids.push(LiquidityVoid {
            symbol: symbol.to_string(),
            timeframe,
            void_top,
            void_bottom,
            size_abs: void_top - void_bottom,
            volume_at_event: current.volume,
            price_velocity_pct: move_pct,
            magnet_strength: magnet_for(move_pct),
            revisited: false,
            created_at: Utc::now(),
        });
    }

    voids
}

fn magnet_for(move_pct: f64) -> MagnetStrength {
    if move_pct > STRONG_MAGNET_PCT {
        MagnetStrength::Strong
    } else if move_pct > MEDIUM_MAGNET_PCT {
        MagnetStrength::Medium
    } else {
        MagnetStrength::Weak
    }
}
