//! Risk alert records produced by portfolio threshold checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which threshold check fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAlertKind {
    VarBreach,
    Drawdown,
    Volatility,
    Concentration,
    StopLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A triggered risk threshold. Alerts are never deleted, only acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub kind: RiskAlertKind,
    pub severity: Severity,
    pub message: String,
    pub threshold: f64,
    pub current_value: f64,
    pub triggered_at: DateTime<Utc>,
    pub acknowledged: bool,
}

impl RiskAlert {
    pub fn new(
        portfolio_id: Uuid,
        kind: RiskAlertKind,
        severity: Severity,
        message: impl Into<String>,
        threshold: f64,
        current_value: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            portfolio_id,
            kind,
            severity,
            message: message.into(),
            threshold,
            current_value,
            triggered_at: Utc::now(),
            acknowledged: false,
        }
    }
}
