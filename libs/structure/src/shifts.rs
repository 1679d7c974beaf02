//! Market-structure shift detection.
//!
//! Swing highs and lows are identified with a symmetric five-bar window; a
//! close through the last confirmed swing level against the prevailing trend
//! emits a shift event and flips the trend state.

use pulse_types::{PriceBar, ShiftKind, StructureShift, Timeframe};

/// Bars required on each side of a bar before it counts as a swing point.
const SWING_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Bullish,
    Bearish,
}

/// Walk the series chronologically, confirming swing points once their full
/// forward window has printed, and emit a [`StructureShift`] whenever a
/// close breaks the last confirmed swing level against the current trend.
///
/// The trend state seeds from the midpoint of the first confirmed swing
/// high/low pair: bullish iff the bar's close sits above the midpoint.
/// Shifts are recorded with `strength = "moderate"` and `confirmed = false`;
/// confirmation is reserved for a downstream consumer.
pub fn detect_structure_shifts(
    symbol: &str,
    timeframe: Timeframe,
    bars: &[PriceBar],
) -> Vec<StructureShift> {
    let mut shifts = Vec::new();
    if bars.len() < 2 * SWING_WINDOW + 1 {
        return shifts;
    }

    let swing_highs = swing_points(bars, |bar| bar.high, |a, b| a > b);
    let swing_lows = swing_points(bars, |bar| bar.low, |a, b| a < b);

    let mut trend: Option<Trend> = None;
    let mut last_swing_high: Option<f64> = None;
    let mut last_swing_low: Option<f64> = None;
    let mut next_high = 0usize;
    let mut next_low = 0usize;

    for (i, bar) in bars.iter().enumerate() {
        // A swing at index s is only knowable once bar s + SWING_WINDOW has
        // printed; confirm any that have become visible by this bar.
        while next_high < swing_highs.len() && swing_highs[next_high] + SWING_WINDOW <= i {
            last_swing_high = Some(bars[swing_highs[next_high]].high);
            next_high += 1;
        }
        while next_low < swing_lows.len() && swing_lows[next_low] + SWING_WINDOW <= i {
            last_swing_low = Some(bars[swing_lows[next_low]].low);
            next_low += 1;
        }

        let (Some(high), Some(low)) = (last_swing_high, last_swing_low) else {
            continue;
        };

        if trend.is_none() {
            let midpoint = (high + low) / 2.0;
            trend = Some(if bar.close > midpoint {
                Trend::Bullish
            } else {
                Trend::Bearish
            });
            continue;
        }

        match trend {
            Some(Trend::Bullish) if bar.close < low => {
                shifts.push(shift(symbol, timeframe, ShiftKind::BullishToBearish, low, high, low, bar));
                trend = Some(Trend::Bearish);
            }
            Some(Trend::Bearish) if bar.close > high => {
                shifts.push(shift(symbol, timeframe, ShiftKind::BearishToBullish, high, high, low, bar));
                trend = Some(Trend::Bullish);
            }
            _ => {}
        }
    }

    shifts
}

fn shift(
    symbol: &str,
    timeframe: Timeframe,
    kind: ShiftKind,
    break_level: f64,
    prior_swing_high: f64,
    prior_swing_low: f64,
    bar: &PriceBar,
) -> StructureShift {
    StructureShift {
        symbol: symbol.to_string(),
        timeframe,
        kind,
        break_level,
        prior_swing_high,
        prior_swing_low,
        strength: "moderate".to_string(),
        confirmed: false,
        timestamp: bar.timestamp,
    }
}

/// Indices of bars that are extreme within the symmetric window on both
/// sides, in ascending order. `extract` selects the compared price and
/// `beats` the direction of dominance.
fn swing_points<F, C>(bars: &[PriceBar], extract: F, beats: C) -> Vec<usize>
where
    F: Fn(&PriceBar) -> f64,
    C: Fn(f64, f64) -> bool,
{
    let mut points = Vec::new();
    if bars.len() < 2 * SWING_WINDOW + 1 {
        return points;
    }

    for i in SWING_WINDOW..bars.len() - SWING_WINDOW {
        let candidate = extract(&bars[i]);
        let dominated = bars[i - SWING_WINDOW..=i + SWING_WINDOW]
            .iter()
            .enumerate()
            .any(|(offset, bar)| offset != SWING_WINDOW && beats(extract(bar), candidate));
        if !dominated {
            points.push(i);
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::bars_from_closes;

    #[test]
    fn upside_break_emits_bearish_to_bullish() {
        // Rally to a swing high at 107, sell off into a swing low at 98.8,
        // drift sideways below the midpoint (seeding a bearish trend), then
        // close through the prior swing high.
        let closes = [
            100.0, 101.0, 99.0, 98.0, 102.0, 105.0, 106.0, 107.0, 106.0, 105.0, 104.0, 103.0,
            102.0, 101.0, 100.0, 99.0, 98.8, 99.5, 100.0, 100.5, 101.0, 101.5, 108.0, 109.0,
        ];
        let series = bars_from_closes(&closes);

        let shifts = detect_structure_shifts("AAPL", Timeframe::H1, &series);
        assert_eq!(shifts.len(), 1);
        let shift = &shifts[0];
        assert_eq!(shift.kind, ShiftKind::BearishToBullish);
        assert!((shift.break_level - 107.0 * 1.005).abs() < 1e-9);
        assert_eq!(shift.strength, "moderate");
        assert!(!shift.confirmed);
    }

    #[test]
    fn downside_break_emits_bullish_to_bearish() {
        // Sell off into a swing low, recover into a swing high above the
        // midpoint (seeding bullish), then close below the swing low.
        let closes = [
            105.0, 104.0, 103.0, 102.0, 101.0, 100.0, 99.0, 100.0, 101.0, 102.0, 103.0, 104.0,
            105.0, 106.0, 105.5, 104.5, 104.8, 104.9, 105.2, 105.1, 104.7, 104.6, 95.0,
        ];
        let series = bars_from_closes(&closes);

        let shifts = detect_structure_shifts("TSLA", Timeframe::H1, &series);
        assert!(!shifts.is_empty());
        assert_eq!(shifts[0].kind, ShiftKind::BullishToBearish);
    }

    #[test]
    fn too_few_bars_is_empty_not_error() {
        let series = bars_from_closes(&[100.0, 101.0, 99.0, 98.0, 102.0, 105.0]);
        assert!(detect_structure_shifts("AAPL", Timeframe::H1, &series).is_empty());
    }

    #[test]
    fn flat_series_never_shifts() {
        let closes = vec![100.0; 30];
        let series = bars_from_closes(&closes);
        assert!(detect_structure_shifts("SPY", Timeframe::H1, &series).is_empty());
    }
}
