//! Error types for orgmeta
//!
//! [`Error`] is the base error for everything that originates in this crate
//! or in the external services it talks to.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for orgmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// The GitHub snapshot could not be downloaded or read.
    ///
    /// Every failure on the object storage path collapses into this variant;
    /// the payload is the text of the underlying cause.
    #[error("Data not found: {0}")]
    DataNotFound(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A projection was applied to an element that is not a mapping
    #[error("Type error: element {index} is {found}, not a mapping")]
    NotAMapping { index: usize, found: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Heroku Platform API and object download errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Set HEROKU_API_KEY or heroku.api_key in the config file.")]
    Unauthorized,

    #[error("Access denied. You don't have permission to access this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Heroku API key not configured. Set HEROKU_API_KEY or heroku.api_key.")]
    MissingApiKey,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Cache storage errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Database(String),

    #[error("Cache entry is corrupt: {0}")]
    Corrupt(String),

    #[error("Cache lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Database(err.to_string())
    }
}
