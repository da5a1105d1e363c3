//! Error types for the cache exercises
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for stores, caches and document collections.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend store failure (connection, protocol, I/O)
    #[error("Store error: {0}")]
    Store(String),

    /// Operation against a key holding the wrong kind of value
    #[error("Wrong type: {0}")]
    WrongType(String),

    /// Stored bytes could not be decoded into the requested type
    #[error("Decode error: {0}")]
    Decode(String),

    /// Page fetch failed (transport error or non-success status)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Document is not a JSON object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Fetch(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
