//! Fair-value gap detection.

use chrono::Utc;
use pulse_types::{FairValueGap, GapDirection, PriceBar, Significance, Timeframe};

/// Minimum gap size, as a fraction of the middle bar's close.
const MIN_GAP_PCT: f64 = 0.001;

/// Gaps above this fraction are high significance.
const HIGH_SIGNIFICANCE_PCT: f64 = 0.01;

/// Gaps above this fraction are medium significance.
const MEDIUM_SIGNIFICANCE_PCT: f64 = 0.005;

/// Scan a three-bar window across the series for fair-value gaps.
///
/// A bullish gap exists at index `i` iff `bar[i].low > bar[i-2].high`; the
/// middle bar never trades back into that range. Bearish is the mirror with
/// highs and lows reversed. Gap percent is measured against the middle
/// bar's close; gaps at or below 0.1% are ignored.
pub fn detect_fair_value_gaps(
    symbol: &str,
    timeframe: Timeframe,
    bars: &[PriceBar],
) -> Vec<FairValueGap> {
    let mut gaps = Vec::new();
    if bars.len() < 3 {
        return gaps;
    }

    for i in 2..bars.len() {
        let first = &bars[i - 2];
        let middle = &bars[i - 1];
        let last = &bars[i];

        if middle.close <= 0.0 {
            continue;
        }

        let (direction, gap_top, gap_bottom) = if last.low > first.high {
            (GapDirection::Bullish, last.low, first.high)
        } else if last.high < first.low {
            (GapDirection::Bearish, first.low, last.high)
        } else {
            continue;
        };

        let size_abs = gap_top - gap_bottom;
        let size_pct = size_abs / middle.close;
        if size_pct <= MIN_GAP_PCT {
            continue;
        }

        gaps.push(FairValueGap {
            symbol: symbol.to_string(),
            timeframe,
            direction,
            gap_top,
            gap_bottom,
            gap_size_abs: size_abs,
            gap_size_pct: size_pct,
            filled: false,
            significance: significance_for(size_pct),
            created_at: Utc::now(),
        });
    }

    gaps
}

/// True once any later bar's range fully covers the gap. Filled gaps are
/// excluded from open-gap queries by the caller maintaining the flag.
pub fn gap_is_filled(gap: &FairValueGap, later_bars: &[PriceBar]) -> bool {
    later_bars
        .iter()
        .any(|bar| bar.low <= gap.gap_bottom && bar.high >= gap.gap_top)
}

fn significance_for(size_pct: f64) -> Significance {
    if size_pct > HIGH_SIGNIFICANCE_PCT {
        Significance::High
    } else if size_pct > MEDIUM_SIGNIFICANCE_PCT {
        Significance::Medium
    } else {
        Significance::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{bars, bars_from_closes};

    #[test]
    fn one_percent_bullish_gap_is_medium() {
        // Middle bar closes at 100; third bar's low clears the first bar's
        // high by exactly 1.0, a 1% gap.
        let series = bars(&[
            (99.5, 100.0, 99.0, 99.8, 1_000.0),
            (100.2, 100.9, 99.9, 100.0, 1_000.0),
            (101.2, 102.0, 101.0, 101.8, 1_000.0),
        ]);

        let gaps = detect_fair_value_gaps("AAPL", Timeframe::H1, &series);
        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.direction, GapDirection::Bullish);
        assert_eq!(gap.significance, Significance::Medium);
        assert!((gap.gap_top - 101.0).abs() < 1e-9);
        assert!((gap.gap_bottom - 100.0).abs() < 1e-9);
        assert!((gap.gap_size_pct - 0.01).abs() < 1e-9);
        assert!(!gap.filled);
    }

    #[test]
    fn bearish_gap_detected() {
        let series = bars(&[
            (101.0, 102.0, 100.5, 101.0, 1_000.0),
            (100.4, 100.4, 99.2, 99.3, 1_000.0),
            (98.5, 98.6, 97.9, 98.0, 1_000.0),
        ]);

        let gaps = detect_fair_value_gaps("TSLA", Timeframe::H1, &series);
        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.direction, GapDirection::Bearish);
        assert!((gap.gap_top - 100.5).abs() < 1e-9);
        assert!((gap.gap_bottom - 98.6).abs() < 1e-9);
        assert_eq!(gap.significance, Significance::High);
    }

    #[test]
    fn sub_threshold_gap_ignored() {
        // A 0.05% gap falls below the 0.1% floor.
        let series = bars(&[
            (99.9, 100.0, 99.8, 100.0, 1_000.0),
            (100.0, 100.1, 99.95, 100.0, 1_000.0),
            (100.06, 100.2, 100.05, 100.1, 1_000.0),
        ]);
        assert!(detect_fair_value_gaps("AAPL", Timeframe::H1, &series).is_empty());
    }

    #[test]
    fn overlapping_bars_produce_no_gaps() {
        // Scenario: a gently walking series with overlapping ±0.5% ranges
        // never leaves a three-bar gap above the floor.
        let series = bars_from_closes(&[100.0, 101.0, 99.0, 98.0, 102.0, 105.0]);
        assert!(detect_fair_value_gaps("AAPL", Timeframe::H1, &series).is_empty());
    }

    #[test]
    fn fill_check_requires_full_coverage() {
        let series = bars(&[
            (99.5, 100.0, 99.0, 99.8, 1_000.0),
            (100.2, 100.9, 99.9, 100.0, 1_000.0),
            (101.2, 102.0, 101.0, 101.8, 1_000.0),
        ]);
        let gaps = detect_fair_value_gaps("AAPL", Timeframe::H1, &series);
        let gap = &gaps[0];

        // Dips into the gap but does not cover it: not filled.
        let partial = bars(&[(101.0, 101.5, 100.6, 100.9, 1_000.0)]);
        assert!(!gap_is_filled(gap, &partial));

        // Trades through the full range: filled.
        let full = bars(&[(101.5, 101.6, 99.8, 99.9, 1_000.0)]);
        assert!(gap_is_filled(gap, &full));
    }
}
