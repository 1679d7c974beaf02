//! Error types for the risk engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RiskError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
