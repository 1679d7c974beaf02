//! Hub configuration.

use pulse_types::Timeframe;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// TCP address the WebSocket listener binds.
    pub bind_addr: String,

    /// Seconds between generation cycles.
    pub generation_interval_secs: u64,

    /// Short delay before the first generation cycle after start.
    pub initial_delay_secs: u64,

    /// Pause between consecutive symbols within one cycle; throttles the
    /// prediction collaborator call rate.
    pub symbol_spacing_ms: u64,

    /// Heartbeat ping interval. A client that has not answered since the
    /// previous ping is dropped at the next tick.
    pub heartbeat_interval_secs: u64,

    /// Signals at or above this confidence are forwarded to the
    /// notification collaborator.
    pub notify_min_confidence: f64,

    /// Hours until a generated signal expires.
    pub signal_ttl_hours: i64,

    /// Symbols generated every cycle. Clients can extend this set at
    /// runtime via the watchlist message.
    pub watchlist: Vec<String>,

    /// Annualized risk-free rate used for Sharpe ratios.
    pub risk_free_rate: f64,

    /// Connection limit; further handshakes are rejected.
    pub max_clients: usize,

    /// Horizon passed to the prediction collaborator.
    pub prediction_horizon_days: u32,

    /// Bar timeframe read for analysis.
    pub bar_timeframe: Timeframe,

    /// Offset from UTC to exchange-local time, in minutes.
    pub utc_offset_minutes: i32,

    /// When true the generation loop runs regardless of market session.
    /// Meant for crypto watch-lists and tests.
    pub ignore_market_hours: bool,

    pub atr_period: usize,
    pub atr_multiplier: f64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8090".to_string(),
            generation_interval_secs: 300,
            initial_delay_secs: 10,
            symbol_spacing_ms: 500,
            heartbeat_interval_secs: 30,
            notify_min_confidence: 80.0,
            signal_ttl_hours: 24,
            watchlist: vec![
                "AAPL".to_string(),
                "MSFT".to_string(),
                "TSLA".to_string(),
                "NVDA".to_string(),
                "SPY".to_string(),
            ],
            risk_free_rate: 0.02,
            max_clients: 1_000,
            prediction_horizon_days: 5,
            bar_timeframe: Timeframe::D1,
            utc_offset_minutes: -300, // US Eastern, standard time
            ignore_market_hours: false,
            atr_period: 14,
            atr_multiplier: 2.0,
        }
    }
}

impl HubConfig {
    pub fn generation_interval(&self) -> Duration {
        Duration::from_secs(self.generation_interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn symbol_spacing(&self) -> Duration {
        Duration::from_millis(self.symbol_spacing_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

/// Load configuration from a TOML file, or defaults when the file does not
/// exist.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<HubConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("no config file at {}, using defaults", path.display());
        return Ok(HubConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Resolve the config path from an environment variable with a fallback.
pub fn resolve_config_path(env_var: &str, default: &str) -> String {
    std::env::var(env_var).unwrap_or_else(|_| default.to_string())
}
