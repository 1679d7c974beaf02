//! # Pulse Signal Hub
//!
//! Real-time signal broadcast service: a WebSocket hub that generates
//! risk-bounded trading signals on a timer, persists them through the
//! storage boundary, and fans them out to subscribed clients under
//! per-client filters. Also hosts the dashboard-facing request surface
//! (portfolio optimization, risk analysis, Kelly/position sizing).

pub mod client;
pub mod collaborators;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod generator;
pub mod hub;
pub mod indicators;
pub mod market_hours;
pub mod metrics;
pub mod protocol;
pub mod storage;

pub use client::ClientSession;
pub use collaborators::{HeuristicPredictor, NotificationSink, PredictionProvider};
pub use config::{load_config, resolve_config_path, HubConfig};
pub use dashboard::{DashboardService, RiskReport};
pub use error::{HubError, Result};
pub use hub::SignalHub;
pub use metrics::HubMetrics;
pub use protocol::{ClientRequest, MessageKind, ServerMessage, SignalFilter, SIGNAL_SOURCE};
pub use storage::{MemoryStore, SignalStore, StoreError, StoreResult};
