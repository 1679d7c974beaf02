//! Hub performance counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters for monitoring the hub. A snapshot is logged periodically and
/// exposed to the dashboard on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubMetrics {
    pub signals_generated: u64,
    pub signals_broadcast: u64,
    pub broadcast_errors: u64,
    pub prediction_failures: u64,
    pub persistence_failures: u64,
    pub cycles_completed: u64,
    pub total_connections: u64,
    pub active_connections: u64,
    pub clients_dropped_by_heartbeat: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for HubMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HubMetrics {
    pub fn new() -> Self {
        Self {
            signals_generated: 0,
            signals_broadcast: 0,
            broadcast_errors: 0,
            prediction_failures: 0,
            persistence_failures: 0,
            cycles_completed: 0,
            total_connections: 0,
            active_connections: 0,
            clients_dropped_by_heartbeat: 0,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl fmt::Display for HubMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HubMetrics {{ signals: {} generated / {} delivered, cycles: {}, clients: {} active / {} total, prediction failures: {}, uptime: {}s }}",
            self.signals_generated,
            self.signals_broadcast,
            self.cycles_completed,
            self.active_connections,
            self.total_connections,
            self.prediction_failures,
            self.uptime_seconds()
        )
    }
}
