//! Error types for the release notification pipeline.

use thiserror::Error;

/// Pipeline-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline-wide error type.
///
/// Every variant is fatal to the invocation; nothing is retried internally.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid delivery method: {0:?} (expected \"bot\" or \"webhook\")")]
    InvalidMethod(String),

    #[error("Failed to fetch release notes: {0}")]
    UpstreamFetch(String),

    #[error("Delivery rejected: {0}")]
    DeliveryRejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingConfiguration(key.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamFetch(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
