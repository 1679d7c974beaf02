//! Drawdown analysis over an equity curve.

use serde::{Deserialize, Serialize};

/// Assumed mean daily recovery rate used for the recovery-time estimate.
/// Tunable; 0.5%/day is deliberately conservative.
pub const ASSUMED_DAILY_RECOVERY_RATE: f64 = 0.005;

/// Drawdown threshold below which the portfolio counts as whole.
const IN_DRAWDOWN_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownReport {
    /// Fractional drawdown from the running peak at the last observation.
    pub current_drawdown: f64,
    /// Deepest fractional drawdown across the series.
    pub max_drawdown: f64,
    /// True when the current drawdown exceeds 1%.
    pub in_drawdown: bool,
    /// Observations since the peak that produced the current drawdown.
    pub duration_bars: usize,
    /// Estimated days to recover at [`ASSUMED_DAILY_RECOVERY_RATE`].
    pub recovery_estimate_days: u32,
}

/// Track the running peak through a value series and report current and
/// maximum drawdown. An empty series yields a zero report.
pub fn analyze_drawdown(values: &[f64]) -> DrawdownReport {
    let mut peak = f64::MIN;
    let mut peak_index = 0usize;
    let mut max_drawdown = 0.0f64;
    let mut current_drawdown = 0.0f64;

    for (i, &value) in values.iter().enumerate() {
        if value > peak {
            peak = value;
            peak_index = i;
        }
        current_drawdown = if peak > 0.0 { (peak - value) / peak } else { 0.0 };
        max_drawdown = max_drawdown.max(current_drawdown);
    }

    let in_drawdown = current_drawdown > IN_DRAWDOWN_THRESHOLD;
    let duration_bars = if values.is_empty() || !in_drawdown {
        0
    } else {
        values.len() - 1 - peak_index
    };

    let recovery_estimate_days = if in_drawdown {
        (current_drawdown / ASSUMED_DAILY_RECOVERY_RATE).ceil() as u32
    } else {
        0
    };

    DrawdownReport {
        current_drawdown,
        max_drawdown,
        in_drawdown,
        duration_bars,
        recovery_estimate_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotone_rise_has_no_drawdown() {
        let report = analyze_drawdown(&[100.0, 105.0, 110.0, 115.0]);
        assert_eq!(report.current_drawdown, 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert!(!report.in_drawdown);
        assert_eq!(report.duration_bars, 0);
        assert_eq!(report.recovery_estimate_days, 0);
    }

    #[test]
    fn drawdown_measured_from_peak() {
        // Peak 120 at index 2, last value 102 → 15% current drawdown,
        // trough 96 → 20% max.
        let report = analyze_drawdown(&[100.0, 110.0, 120.0, 108.0, 96.0, 102.0]);
        assert!((report.current_drawdown - 0.15).abs() < 1e-12);
        assert!((report.max_drawdown - 0.20).abs() < 1e-12);
        assert!(report.in_drawdown);
        assert_eq!(report.duration_bars, 3);
        assert_eq!(report.recovery_estimate_days, 30);
    }

    #[test]
    fn recovered_series_reports_historical_max_only() {
        let report = analyze_drawdown(&[100.0, 80.0, 100.0, 101.0]);
        assert_eq!(report.current_drawdown, 0.0);
        assert!((report.max_drawdown - 0.20).abs() < 1e-12);
        assert!(!report.in_drawdown);
    }

    #[test]
    fn empty_series_is_a_zero_report() {
        let report = analyze_drawdown(&[]);
        assert_eq!(report.max_drawdown, 0.0);
        assert!(!report.in_drawdown);
    }

    #[test]
    fn shallow_dip_is_not_a_drawdown_state() {
        let report = analyze_drawdown(&[100.0, 99.5]);
        assert!(report.current_drawdown > 0.0);
        assert!(!report.in_drawdown);
    }
}
