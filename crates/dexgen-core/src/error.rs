use crate::ConfigError;
use thiserror::Error;

/// A single failed attempt at fetching a JSON resource.
///
/// Every variant is retried the same way by the fetcher; a body that does not
/// parse as JSON is no different from a dropped connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("invalid JSON from {url}: {message}")]
    Parse { url: String, message: String },
}

/// Raised once the retry budget for a URL is spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fetching {url} failed after {attempts} attempts: {source}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: TransportError,
}

#[derive(Error, Debug)]
pub enum DexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Document error: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, DexError>;
