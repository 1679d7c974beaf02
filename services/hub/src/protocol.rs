//! Client-facing wire protocol.
//!
//! Clients speak JSON text frames over the persistent WebSocket channel.
//! Requests are tagged by `type`; every hub-to-client push is a
//! [`ServerMessage`] envelope.

use chrono::{DateTime, Utc};
use pulse_types::{Signal, SignalType};
use serde::{Deserialize, Serialize};

/// Source tag attached to signals generated by this engine, matched against
/// the `sources` filter field.
pub const SIGNAL_SOURCE: &str = "quant_engine";

/// Client → hub requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Subscribe {
        symbols: Vec<String>,
    },
    Unsubscribe {
        symbols: Vec<String>,
    },
    /// Internally tagged newtype: the filter's fields sit inline next to
    /// the `type` tag on the wire.
    Filter(SignalFilter),
    Watchlist {
        symbols: Vec<String>,
    },
    RequestSignals,
    GeneratePrediction {
        symbol: String,
        horizon_days: u32,
    },
}

/// Per-client delivery filter. Every field that is present must match for a
/// signal to be delivered; absent fields do not constrain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_types: Option<Vec<SignalType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl SignalFilter {
    /// True when every present field accepts the signal.
    pub fn accepts(&self, signal: &Signal, source: &str) -> bool {
        if let Some(symbols) = &self.symbols {
            if !symbols.iter().any(|s| s == &signal.symbol) {
                return false;
            }
        }
        if let Some(min_confidence) = self.min_confidence {
            if signal.confidence < min_confidence {
                return false;
            }
        }
        if let Some(signal_types) = &self.signal_types {
            if !signal_types.contains(&signal.signal_type) {
                return false;
            }
        }
        if let Some(sources) = &self.sources {
            if !sources.iter().any(|s| s == source) {
                return false;
            }
        }
        true
    }
}

/// Kind discriminator on hub → client pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Signal,
    Alert,
    Status,
    Prediction,
}

/// Hub → client envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ServerMessage {
    pub fn new(kind: MessageKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Envelope for a generated signal. Alert-classified signals go out
    /// under the alert kind.
    pub fn signal(signal: &Signal) -> Self {
        let kind = if signal.signal_type == SignalType::Alert {
            MessageKind::Alert
        } else {
            MessageKind::Signal
        };
        Self::new(kind, serde_json::json!(signal))
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::new(
            MessageKind::Status,
            serde_json::json!({ "message": text.into() }),
        )
    }

    pub fn error_status(text: impl Into<String>) -> Self {
        Self::new(
            MessageKind::Status,
            serde_json::json!({ "error": text.into() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pulse_types::{Direction, RiskLevel};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn signal(symbol: &str, confidence: f64, signal_type: SignalType) -> Signal {
        let now = Utc::now();
        Signal {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            signal_type,
            confidence,
            direction: Direction::Up,
            price: 100.0,
            target_price: 106.0,
            stop_loss: 96.0,
            layer_scores: BTreeMap::new(),
            key_factors: vec![],
            risk_level: RiskLevel::Medium,
            is_active: true,
            expires_at: now + Duration::hours(24),
            notified: false,
            created_at: now,
        }
    }

    #[test]
    fn requests_parse_by_type_tag() {
        let request: ClientRequest =
            serde_json::from_str(r#"{"type":"subscribe","symbols":["AAPL","TSLA"]}"#).unwrap();
        assert!(matches!(request, ClientRequest::Subscribe { symbols } if symbols.len() == 2));

        let request: ClientRequest = serde_json::from_str(r#"{"type":"request_signals"}"#).unwrap();
        assert!(matches!(request, ClientRequest::RequestSignals));

        let request: ClientRequest = serde_json::from_str(
            r#"{"type":"generate_prediction","symbol":"NVDA","horizon_days":5}"#,
        )
        .unwrap();
        assert!(matches!(request, ClientRequest::GeneratePrediction { symbol, .. } if symbol == "NVDA"));
    }

    #[test]
    fn filter_fields_are_flattened() {
        let request: ClientRequest =
            serde_json::from_str(r#"{"type":"filter","min_confidence":80,"symbols":["AAPL"]}"#)
                .unwrap();
        let ClientRequest::Filter(filter) = request else {
            panic!("expected filter request");
        };
        assert_eq!(filter.min_confidence, Some(80.0));
        assert_eq!(filter.symbols.as_deref(), Some(&["AAPL".to_string()][..]));
        assert!(filter.signal_types.is_none());
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = SignalFilter::default();
        assert!(filter.accepts(&signal("AAPL", 55.0, SignalType::Buy), SIGNAL_SOURCE));
    }

    #[test]
    fn min_confidence_rejects_below() {
        let filter = SignalFilter {
            min_confidence: Some(80.0),
            ..Default::default()
        };
        assert!(!filter.accepts(&signal("AAPL", 60.0, SignalType::Buy), SIGNAL_SOURCE));
        assert!(filter.accepts(&signal("AAPL", 85.0, SignalType::Buy), SIGNAL_SOURCE));
    }

    #[test]
    fn all_present_fields_must_match() {
        let filter = SignalFilter {
            symbols: Some(vec!["AAPL".to_string()]),
            min_confidence: Some(70.0),
            signal_types: Some(vec![SignalType::Buy]),
            sources: Some(vec![SIGNAL_SOURCE.to_string()]),
        };
        assert!(filter.accepts(&signal("AAPL", 75.0, SignalType::Buy), SIGNAL_SOURCE));
        assert!(!filter.accepts(&signal("TSLA", 75.0, SignalType::Buy), SIGNAL_SOURCE));
        assert!(!filter.accepts(&signal("AAPL", 75.0, SignalType::Sell), SIGNAL_SOURCE));
        assert!(!filter.accepts(&signal("AAPL", 75.0, SignalType::Buy), "other_engine"));
    }

    #[test]
    fn alert_signals_use_the_alert_kind() {
        let message = ServerMessage::signal(&signal("AAPL", 55.0, SignalType::Alert));
        assert_eq!(message.kind, MessageKind::Alert);
        let message = ServerMessage::signal(&signal("AAPL", 75.0, SignalType::Buy));
        assert_eq!(message.kind, MessageKind::Signal);
    }
}
