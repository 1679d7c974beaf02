//! Signal construction from a prediction plus risk-engine output.

use chrono::{Duration, Utc};
use pulse_risk::StopTarget;
use pulse_types::{Direction, Prediction, Signal, SignalType};
use uuid::Uuid;

/// Confidence at or above which a directional prediction becomes a
/// buy/sell signal.
pub const ACTIONABLE_CONFIDENCE: f64 = 70.0;

/// Confidence at or above which a prediction is worth an alert.
pub const ALERT_CONFIDENCE: f64 = 50.0;

/// Classify a prediction into a signal type by confidence thresholds.
pub fn classify(confidence: f64, direction: Direction) -> SignalType {
    if confidence >= ACTIONABLE_CONFIDENCE {
        match direction {
            Direction::Up => SignalType::Buy,
            Direction::Down => SignalType::Sell,
            Direction::Flat => SignalType::Hold,
        }
    } else if confidence >= ALERT_CONFIDENCE {
        SignalType::Alert
    } else {
        SignalType::Hold
    }
}

/// Assemble a [`Signal`] from the prediction and an ATR stop/target computed
/// on the long side. Short-side signals mirror the stop and target around
/// the current price.
pub fn build_signal(
    symbol: &str,
    prediction: &Prediction,
    last_close: f64,
    long_side: StopTarget,
    ttl_hours: i64,
) -> Signal {
    let (stop_loss, target_price) = match prediction.direction {
        Direction::Down => (
            last_close + (last_close - long_side.stop),
            last_close - (long_side.target - last_close),
        ),
        Direction::Up | Direction::Flat => (long_side.stop, long_side.target),
    };

    let mut key_factors = prediction.key_factors.bullish.clone();
    key_factors.extend(prediction.key_factors.bearish.iter().cloned());

    let now = Utc::now();
    Signal {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        signal_type: classify(prediction.confidence, prediction.direction),
        confidence: prediction.confidence.clamp(0.0, 100.0),
        direction: prediction.direction,
        price: last_close,
        target_price,
        stop_loss,
        layer_scores: prediction.layer_breakdown.clone(),
        key_factors,
        risk_level: prediction.risk_level,
        is_active: true,
        expires_at: now + Duration::hours(ttl_hours),
        notified: false,
        created_at: now,
    }
}
