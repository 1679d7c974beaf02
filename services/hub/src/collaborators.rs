//! External collaborator boundaries: prediction and notification.

use crate::error::{HubError, Result};
use crate::indicators::{annualized_volatility, wilder_rsi, MovingAverage};
use crate::storage::SignalStore;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use pulse_types::{Direction, GapDirection, KeyFactors, Prediction, RiskLevel, ShiftKind, Timeframe};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The upstream prediction model: symbol in, directional score out.
/// Treated as a black box; a failure for one symbol is caught and logged by
/// the generation loop without aborting the cycle.
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    async fn generate(&self, symbol: &str, horizon_days: u32) -> Result<Prediction>;
}

/// Fan-out delivery of high-confidence signals to chat/webhook targets.
/// Fire-and-forget: the hub does not depend on the result.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_to_all_targets(&self, payload: serde_json::Value);
}

const SHORT_MA_PERIOD: usize = 10;
const LONG_MA_PERIOD: usize = 30;
const RSI_WINDOW: usize = 14;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Built-in prediction implementation combining a moving-average cross,
/// rate-of-change momentum, and Wilder-smoothed RSI over stored closes.
///
/// Used by the default binary wiring when no external model is attached;
/// production deployments inject their own [`PredictionProvider`].
pub struct HeuristicPredictor {
    store: Arc<dyn SignalStore>,
    timeframe: Timeframe,
}

impl HeuristicPredictor {
    pub fn new(store: Arc<dyn SignalStore>, timeframe: Timeframe) -> Self {
        Self { store, timeframe }
    }
}

#[async_trait]
impl PredictionProvider for HeuristicPredictor {
    async fn generate(&self, symbol: &str, horizon_days: u32) -> Result<Prediction> {
        let bars = self
            .store
            .price_bars(symbol, self.timeframe, LONG_MA_PERIOD * 2)
            .await?;
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();

        if closes.len() < LONG_MA_PERIOD {
            return Err(HubError::prediction(format!(
                "{symbol}: {} closes available, {} required",
                closes.len(),
                LONG_MA_PERIOD
            )));
        }

        let mut short_ma = MovingAverage::new(SHORT_MA_PERIOD);
        let mut long_ma = MovingAverage::new(LONG_MA_PERIOD);
        let mut short_value = None;
        let mut long_value = None;
        for &close in &closes {
            short_value = short_ma.update(close).or(short_value);
            long_value = long_ma.update(close).or(long_value);
        }
        let (Some(short_value), Some(long_value)) = (short_value, long_value) else {
            return Err(HubError::prediction(format!(
                "{symbol}: indicator warm-up incomplete"
            )));
        };

        let last_close = closes[closes.len() - 1];
        let momentum = closes[closes.len() - 1 - SHORT_MA_PERIOD.min(closes.len() - 1)];
        let momentum = if momentum > 0.0 {
            last_close / momentum * 100.0
        } else {
            100.0
        };
        let rsi = wilder_rsi(&closes, RSI_WINDOW);
        let volatility = annualized_volatility(&closes);

        let mut factors = KeyFactors::default();
        let trend_up = short_value > long_value;
        if trend_up {
            factors.bullish.push("short MA above long MA".to_string());
        } else {
            factors.bearish.push("short MA below long MA".to_string());
        }
        if momentum > 105.0 {
            factors.bullish.push("strong positive momentum".to_string());
        } else if momentum < 95.0 {
            factors.bearish.push("strong negative momentum".to_string());
        }
        if rsi >= RSI_OVERBOUGHT {
            factors.bearish.push(format!("RSI overbought at {rsi:.1}"));
        } else if rsi <= RSI_OVERSOLD {
            factors.bullish.push(format!("RSI oversold at {rsi:.1}"));
        }

        // Structural layer: recent trend breaks and open fair-value gaps.
        let structure = pulse_structure::analyze(symbol, self.timeframe, &bars);
        let mut structure_score: f64 = 50.0;
        if let Some(shift) = structure.shifts.last() {
            match shift.kind {
                ShiftKind::BearishToBullish => {
                    structure_score += 20.0;
                    factors
                        .bullish
                        .push(format!("bullish structure break above {:.2}", shift.break_level));
                }
                ShiftKind::BullishToBearish => {
                    structure_score -= 20.0;
                    factors
                        .bearish
                        .push(format!("bearish structure break below {:.2}", shift.break_level));
                }
            }
        }
        if let Some(gap) = structure.gaps.iter().rev().find(|gap| !gap.filled) {
            match gap.direction {
                GapDirection::Bullish => {
                    structure_score += 10.0;
                    factors.bullish.push(format!(
                        "open bullish fair-value gap {:.2}-{:.2}",
                        gap.gap_bottom, gap.gap_top
                    ));
                }
                GapDirection::Bearish => {
                    structure_score -= 10.0;
                    factors.bearish.push(format!(
                        "open bearish fair-value gap {:.2}-{:.2}",
                        gap.gap_bottom, gap.gap_top
                    ));
                }
            }
        }
        if !structure.voids.is_empty() {
            factors
                .bearish
                .push(format!("{} thin-liquidity zones nearby", structure.voids.len()));
        }

        let bullish_score = factors.bullish.len() as f64;
        let bearish_score = factors.bearish.len() as f64;
        let (direction, confidence) = if bullish_score > bearish_score {
            (Direction::Up, 50.0 + 15.0 * bullish_score - 5.0 * bearish_score)
        } else if bearish_score > bullish_score {
            (Direction::Down, 50.0 + 15.0 * bearish_score - 5.0 * bullish_score)
        } else {
            (Direction::Flat, 40.0)
        };
        let confidence = confidence.clamp(0.0, 95.0);

        let expected_move = 0.02 * (horizon_days.max(1) as f64).sqrt();
        let price_target = match direction {
            Direction::Up => last_close * (1.0 + expected_move),
            Direction::Down => last_close * (1.0 - expected_move),
            Direction::Flat => last_close,
        };

        let risk_level = if volatility > 0.40 {
            RiskLevel::High
        } else if volatility > 0.20 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        Ok(Prediction {
            direction,
            confidence,
            price_target,
            risk_level,
            layer_breakdown: BTreeMap::from([
                ("trend".to_string(), if trend_up { 70.0 } else { 30.0 }),
                ("momentum".to_string(), momentum),
                ("rsi".to_string(), rsi),
                ("structure".to_string(), structure_score.clamp(0.0, 100.0)),
            ]),
            key_factors: factors,
            target_date: Utc::now() + Duration::days(i64::from(horizon_days)),
        })
    }
}
