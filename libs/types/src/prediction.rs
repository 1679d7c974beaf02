//! Shapes exchanged with the prediction and notification collaborators.

use crate::signal::{Direction, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Factors supporting each side of a prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyFactors {
    pub bullish: Vec<String>,
    pub bearish: Vec<String>,
}

/// Directional prediction for a symbol over a horizon, as returned by the
/// prediction collaborator. Treated as a black box by the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: Direction,
    /// Confidence in [0, 100].
    pub confidence: f64,
    pub price_target: f64,
    pub risk_level: RiskLevel,
    pub layer_breakdown: BTreeMap<String, f64>,
    pub key_factors: KeyFactors,
    pub target_date: DateTime<Utc>,
}

/// A delivery endpoint owned by the notification collaborator. Consumed,
/// not owned, by the signal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub target_type: String,
    pub target_id: String,
    pub filters: Option<BTreeMap<String, String>>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_round_trip() {
        let prediction = Prediction {
            direction: Direction::Up,
            confidence: 74.0,
            price_target: 205.0,
            risk_level: RiskLevel::Medium,
            layer_breakdown: BTreeMap::from([("momentum".to_string(), 68.0)]),
            key_factors: KeyFactors {
                bullish: vec!["RSI recovering from oversold".to_string()],
                bearish: vec![],
            },
            target_date: Utc::now(),
        };
        let json = serde_json::to_string(&prediction).unwrap();
        assert!(json.contains("\"direction\":\"up\""));
        let parsed: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.key_factors.bullish.len(), 1);
    }
}
