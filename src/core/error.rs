//! Error handling - Hierarchical errors for the grid engine

use thiserror::Error;

use crate::core::types::OrderId;

pub type Result<T> = std::result::Result<T, Error>;

/// Grid engine error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Venue rejected the request
    #[error("Exchange error: {0}")]
    Exchange(String),

    /// Venue temporarily unreachable or overloaded (5xx, rate limit)
    #[error("Venue unavailable: {0}")]
    Unavailable(String),

    /// Venue does not know the order (already filled, cancelled or never existed)
    #[error("Order not found on venue: {0}")]
    OrderNotFound(OrderId),

    /// Order id is not owned by any level of the grid
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Reset parameters rejected
    #[error("Invalid grid parameters: {0}")]
    InvalidParams(String),

    /// Internal consistency violation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Transport-level failure worth retrying; venue rejections are final
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Unavailable(_))
    }
}
