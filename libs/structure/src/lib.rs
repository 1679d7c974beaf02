//! # Market Structure Analyzer
//!
//! Pure detectors over an ascending [`PriceBar`] series for one
//! (symbol, timeframe): fair-value gaps, trend-reversal structure shifts,
//! and liquidity voids.
//!
//! These are statistical detectors, not hard preconditions: a series shorter
//! than a detector's minimum window (3 bars for gaps, 5-bar swing windows
//! for shifts) yields an empty result set rather than an error.

pub mod gaps;
pub mod shifts;
pub mod voids;

pub use gaps::{detect_fair_value_gaps, gap_is_filled};
pub use shifts::detect_structure_shifts;
pub use voids::detect_liquidity_voids;

use pulse_types::{FairValueGap, LiquidityVoid, PriceBar, StructureShift, Timeframe};

/// All structural events found in one series.
#[derive(Debug, Clone, Default)]
pub struct StructureReport {
    pub gaps: Vec<FairValueGap>,
    pub shifts: Vec<StructureShift>,
    pub voids: Vec<LiquidityVoid>,
}

/// Run all three detectors over one series.
pub fn analyze(symbol: &str, timeframe: Timeframe, bars: &[PriceBar]) -> StructureReport {
    let report = StructureReport {
        gaps: detect_fair_value_gaps(symbol, timeframe, bars),
        shifts: detect_structure_shifts(symbol, timeframe, bars),
        voids: detect_liquidity_voids(symbol, timeframe, bars),
    };
    tracing::debug!(
        symbol,
        timeframe = %timeframe,
        gaps = report.gaps.len(),
        shifts = report.shifts.len(),
        voids = report.voids.len(),
        "structure analysis complete"
    );
    report
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{Duration, TimeZone, Utc};
    use pulse_types::{PriceBar, Timeframe};

    /// Build a bar series from (open, high, low, close, volume) tuples,
    /// one hour apart.
    pub fn bars(rows: &[(f64, f64, f64, f64, f64)]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close, volume))| PriceBar {
                timestamp: start + Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume,
                timeframe: Timeframe::H1,
            })
            .collect()
    }

    /// Bar series from closes only, with a ±0.5% synthetic range and flat
    /// volume.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        let rows: Vec<(f64, f64, f64, f64, f64)> = closes
            .iter()
            .map(|&c| (c, c * 1.005, c * 0.995, c, 1_000.0))
            .collect();
        bars(&rows)
    }
}
