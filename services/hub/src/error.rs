//! Error types for the hub service.

use crate::storage::StoreError;
use thiserror::Error;

/// Hub-level errors. `InvalidRequest` marks bad caller input;
/// `Storage`/`Prediction` mark an unavailable dependency. Dashboard callers
/// can tell the two apart, and the generation loop treats both as
/// "this cycle degraded" rather than fatal.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("prediction error: {message}")]
    Prediction { message: String },

    #[error("risk engine error: {0}")]
    Risk(#[from] pulse_risk::RiskError),

    #[error("optimizer error: {0}")]
    Portfolio(#[from] pulse_portfolio::PortfolioError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction {
            message: message.into(),
        }
    }

    /// True when retrying against a healthy dependency could succeed, as
    /// opposed to a request the caller must fix.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Prediction { .. } | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
