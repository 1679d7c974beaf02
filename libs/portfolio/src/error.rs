//! Error types for the portfolio optimizer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("asset basket is empty")]
    EmptyBasket,

    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl PortfolioError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
