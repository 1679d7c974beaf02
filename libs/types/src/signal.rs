//! Trading signal definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Signal classification derived from prediction confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
    Alert,
}

/// Predicted price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

/// Coarse risk bucket attached to a signal or prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A generated trading signal.
///
/// Created by the hub on each generation cycle and broadcast to subscribed
/// clients. Immutable once created except for the `is_active` and `notified`
/// flags; a signal goes inactive once `expires_at` passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub signal_type: SignalType,
    /// Confidence in [0, 100].
    pub confidence: f64,
    pub direction: Direction,
    pub price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    /// Per-layer score breakdown from the prediction model.
    pub layer_scores: BTreeMap<String, f64>,
    pub key_factors: Vec<String>,
    pub risk_level: RiskLevel,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
