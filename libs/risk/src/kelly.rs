//! Kelly-criterion bet sizing.

use serde::{Deserialize, Serialize};

/// Completed predictions required before the history-derived variant will
/// size a position.
const MIN_SAMPLE_SIZE: usize = 10;

/// Kelly sizing output. `recommended_allocation` is the half-Kelly fraction
/// capped by the caller's maximum, so it never exceeds `half_kelly`, which
/// never exceeds `kelly_fraction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyRecommendation {
    pub win_probability: f64,
    pub payoff_ratio: f64,
    pub kelly_fraction: f64,
    pub half_kelly: f64,
    pub quarter_kelly: f64,
    pub recommended_allocation: f64,
    pub reasoning: String,
}

/// Full Kelly from explicit win statistics.
///
/// `f = (p*b - (1-p)) / b` with `b = avg_win / avg_loss` (payoff ratio 1
/// when `avg_loss` is zero), clamped to `[0, 1]`. The recommendation is
/// half-Kelly capped at `max_allocation`.
pub fn kelly_criterion(
    win_probability: f64,
    avg_win: f64,
    avg_loss: f64,
    max_allocation: f64,
) -> KellyRecommendation {
    let p = win_probability.clamp(0.0, 1.0);
    let b = if avg_loss == 0.0 { 1.0 } else { avg_win / avg_loss };

    let raw = if b > 0.0 { (p * b - (1.0 - p)) / b } else { 0.0 };
    let fraction = raw.clamp(0.0, 1.0);
    let half = fraction / 2.0;
    let quarter = fraction / 4.0;

    KellyRecommendation {
        win_probability: p,
        payoff_ratio: b,
        kelly_fraction: fraction,
        half_kelly: half,
        quarter_kelly: quarter,
        recommended_allocation: half.min(max_allocation).max(0.0),
        reasoning: reasoning_for(raw),
    }
}

/// Kelly sizing derived from completed trade returns for one symbol.
///
/// Fewer than ten completed samples returns a neutral recommendation
/// (`p = 0.5`, zero fraction) with an explicit insufficient-data reasoning
/// string rather than fabricating an edge.
pub fn kelly_from_returns(trade_returns: &[f64], max_allocation: f64) -> KellyRecommendation {
    if trade_returns.len() < MIN_SAMPLE_SIZE {
        return KellyRecommendation {
            win_probability: 0.5,
            payoff_ratio: 1.0,
            kelly_fraction: 0.0,
            half_kelly: 0.0,
            quarter_kelly: 0.0,
            recommended_allocation: 0.0,
            reasoning: format!(
                "insufficient data: {} completed trades, {} required",
                trade_returns.len(),
                MIN_SAMPLE_SIZE
            ),
        };
    }

    let wins: Vec<f64> = trade_returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = trade_returns
        .iter()
        .copied()
        .filter(|r| *r < 0.0)
        .map(f64::abs)
        .collect();

    let p = wins.len() as f64 / trade_returns.len() as f64;
    let avg_win = mean(&wins);
    let avg_loss = mean(&losses);

    kelly_criterion(p, avg_win, avg_loss, max_allocation)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn reasoning_for(raw_fraction: f64) -> String {
    if raw_fraction <= 0.0 {
        "negative edge: no position".to_string()
    } else if raw_fraction < 0.05 {
        "marginal edge: minimal allocation".to_string()
    } else if raw_fraction < 0.15 {
        "moderate edge: half-Kelly sizing".to_string()
    } else if raw_fraction < 0.25 {
        "good edge: half-Kelly sizing".to_string()
    } else {
        "strong edge: quarter-Kelly advised to damp variance".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn textbook_kelly() {
        // p = 0.6, b = 2 → f = (1.2 - 0.4) / 2 = 0.4.
        let rec = kelly_criterion(0.6, 0.10, 0.05, 0.25);
        assert!((rec.kelly_fraction - 0.4).abs() < 1e-12);
        assert!((rec.half_kelly - 0.2).abs() < 1e-12);
        assert!((rec.recommended_allocation - 0.2).abs() < 1e-12);
        assert!(rec.reasoning.contains("quarter-Kelly"));
    }

    #[test]
    fn negative_edge_yields_zero() {
        let rec = kelly_criterion(0.3, 0.05, 0.05, 0.25);
        assert_eq!(rec.kelly_fraction, 0.0);
        assert_eq!(rec.recommended_allocation, 0.0);
        assert!(rec.reasoning.contains("no position"));
    }

    #[test]
    fn zero_loss_defaults_payoff_to_one() {
        let rec = kelly_criterion(0.6, 0.10, 0.0, 0.25);
        assert!((rec.payoff_ratio - 1.0).abs() < 1e-12);
        // f = 0.6 - 0.4 = 0.2
        assert!((rec.kelly_fraction - 0.2).abs() < 1e-12);
    }

    #[test]
    fn max_allocation_caps_recommendation() {
        let rec = kelly_criterion(0.9, 0.10, 0.02, 0.10);
        assert!(rec.half_kelly > 0.10);
        assert!((rec.recommended_allocation - 0.10).abs() < 1e-12);
    }

    #[test]
    fn short_history_is_neutral() {
        let rec = kelly_from_returns(&[0.02, -0.01, 0.03], 0.25);
        assert_eq!(rec.win_probability, 0.5);
        assert_eq!(rec.kelly_fraction, 0.0);
        assert_eq!(rec.recommended_allocation, 0.0);
        assert!(rec.reasoning.starts_with("insufficient data"));
    }

    #[test]
    fn history_derives_win_stats() {
        let returns = [0.02, 0.02, 0.02, 0.02, 0.02, 0.02, -0.01, -0.01, -0.01, -0.01];
        let rec = kelly_from_returns(&returns, 0.25);
        assert!((rec.win_probability - 0.6).abs() < 1e-12);
        assert!((rec.payoff_ratio - 2.0).abs() < 1e-9);
        assert!((rec.kelly_fraction - 0.4).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn kelly_bounds_hold(
            p in 0.0f64..=1.0,
            avg_win in 0.0001f64..1.0,
            avg_loss in 0.0001f64..1.0,
            max_allocation in 0.0f64..=1.0,
        ) {
            let rec = kelly_criterion(p, avg_win, avg_loss, max_allocation);
            prop_assert!(rec.kelly_fraction >= 0.0 && rec.kelly_fraction <= 1.0);
            prop_assert!(rec.recommended_allocation >= 0.0);
            prop_assert!(rec.recommended_allocation <= max_allocation + 1e-12);
            prop_assert!(rec.recommended_allocation <= rec.half_kelly + 1e-12);
            prop_assert!(rec.half_kelly <= rec.kelly_fraction + 1e-12);
        }
    }
}
