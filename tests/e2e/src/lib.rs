//! Shared harness for socket-level hub tests: an in-memory store seeded
//! with synthetic bars, a deterministic prediction stub, and a thin
//! WebSocket client wrapper.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures_util::{SinkExt, StreamExt};
use pulse_hub::{HubConfig, MemoryStore, PredictionProvider, Result as HubResult, SignalHub, SignalStore};
use pulse_types::{Direction, KeyFactors, Prediction, PriceBar, RiskLevel, Timeframe};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Prediction stub returning a fixed confidence and direction for every
/// symbol.
pub struct FixedPredictor {
    pub confidence: f64,
    pub direction: Direction,
}

#[async_trait]
impl PredictionProvider for FixedPredictor {
    async fn generate(&self, _symbol: &str, horizon_days: u32) -> HubResult<Prediction> {
        Ok(Prediction {
            direction: self.direction,
            confidence: self.confidence,
            price_target: 110.0,
            risk_level: RiskLevel::Medium,
            layer_breakdown: BTreeMap::from([("trend".to_string(), 70.0)]),
            key_factors: KeyFactors::default(),
            target_date: Utc::now() + ChronoDuration::days(i64::from(horizon_days)),
        })
    }
}

pub struct TestHub {
    pub hub: Arc<SignalHub>,
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
}

/// Start a hub on an ephemeral port with long timer intervals so tests
/// drive generation cycles explicitly.
pub async fn start_test_hub(watchlist: &[&str], confidence: f64) -> TestHub {
    let store = Arc::new(MemoryStore::new());
    seed_bars(&store, watchlist).await;

    let config = HubConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        generation_interval_secs: 3_600,
        initial_delay_secs: 3_600,
        heartbeat_interval_secs: 3_600,
        symbol_spacing_ms: 0,
        ignore_market_hours: true,
        watchlist: watchlist.iter().map(|s| s.to_string()).collect(),
        ..HubConfig::default()
    };

    let predictor = Arc::new(FixedPredictor {
        confidence,
        direction: Direction::Up,
    });
    let hub = Arc::new(SignalHub::new(
        config,
        Arc::clone(&store) as Arc<dyn SignalStore>,
        predictor,
    ));
    let addr = hub.start().await.expect("hub start");

    TestHub { hub, addr, store }
}

pub async fn seed_bars(store: &Arc<MemoryStore>, symbols: &[&str]) {
    let start = Utc::now() - ChronoDuration::days(40);
    for symbol in symbols {
        let bars: Vec<PriceBar> = (0..40)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                PriceBar {
                    timestamp: start + ChronoDuration::days(i),
                    open: close,
                    high: close * 1.005,
                    low: close * 0.995,
                    close,
                    volume: 1_000.0,
                    timeframe: Timeframe::D1,
                }
            })
            .collect();
        store.insert_price_bars(symbol, bars).await.expect("seed bars");
    }
}

/// Minimal WebSocket client for the hub protocol.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let (stream, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("websocket connect");
        Self { stream }
    }

    pub async fn send(&mut self, request: serde_json::Value) {
        self.stream
            .send(Message::Text(request.to_string()))
            .await
            .expect("send request");
    }

    /// Next JSON text frame, answering pings transparently. None on timeout
    /// or connection close.
    pub async fn next_json(&mut self, timeout: Duration) -> Option<serde_json::Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.stream.next())
                .await
                .ok()??;
            match frame.ok()? {
                Message::Text(text) => return serde_json::from_str(&text).ok(),
                Message::Ping(payload) => {
                    let _ = self.stream.send(Message::Pong(payload)).await;
                }
                Message::Close(_) => return None,
                _ => {}
            }
        }
    }

    /// Read frames until one with the given `type` tag arrives.
    pub async fn wait_for_kind(
        &mut self,
        kind: &str,
        timeout: Duration,
    ) -> Option<serde_json::Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .unwrap_or_default();
            if remaining.is_zero() {
                return None;
            }
            let message = self.next_json(remaining).await?;
            if message.get("type").and_then(|v| v.as_str()) == Some(kind) {
                return Some(message);
            }
        }
    }

    /// True when the server closes the connection within the timeout.
    pub async fn expect_close(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Ok(Some(Ok(Message::Close(_)))) | Ok(None) => return true,
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(_))) => return true,
                Err(_) => return false,
            }
        }
    }
}
