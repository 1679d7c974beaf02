//! Technical indicators backing the built-in heuristic predictor.

use std::collections::VecDeque;

/// Simple moving average over a fixed period.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl MovingAverage {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    /// Add a value; returns the average once the window is full.
    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }

        if self.values.len() == self.period {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }
}

/// Rate-of-change momentum: current / value-period-bars-ago × 100.
#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    values: VecDeque<f64>,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        if self.values.len() > self.period + 1 {
            self.values.pop_front();
        }

        if self.values.len() == self.period + 1 {
            let past = *self.values.front()?;
            if past != 0.0 {
                Some(self.values.back()? / past * 100.0)
            } else {
                None
            }
        } else {
            None
        }
    }
}

/// Relative Strength Index with Wilder's smoothing.
///
/// Returns the neutral 50.0 when fewer than `window + 1` closes are
/// available, 100.0 when there are no losses in the window.
pub fn wilder_rsi(closes: &[f64], window: usize) -> f64 {
    if closes.len() < window + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let mut avg_gain = gains[..window].iter().sum::<f64>() / window as f64;
    let mut avg_loss = losses[..window].iter().sum::<f64>() / window as f64;

    for i in window..deltas.len() {
        avg_gain = (avg_gain * (window - 1) as f64 + gains[i]) / window as f64;
        avg_loss = (avg_loss * (window - 1) as f64 + losses[i]) / window as f64;
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Annualized volatility of a close series from daily log-free returns.
pub fn annualized_volatility(closes: &[f64]) -> f64 {
    if closes.len() < 3 {
        return 0.0;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<f64>()
        / (returns.len() - 1) as f64;
    (variance * 252.0).sqrt()
}
