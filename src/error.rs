//! Error types for cache construction and tier plumbing
//!
//! The read and write paths of [`LfuCache`](crate::lfu::LfuCache) and
//! [`LayeredCache`](crate::layered::LayeredCache) never fail: a miss is an
//! absent value, and remote failures are logged and degraded to misses.
//! These errors only surface from configuration validation and from direct
//! use of a remote tier or codec.

use thiserror::Error;

use crate::remote::RemoteError;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid construction parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote tier failure (transport or marshalling)
    #[error("Remote tier error: {0}")]
    Remote(#[from] RemoteError),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::Config("capacity must be set".to_string());
        assert_eq!(error.to_string(), "Configuration error: capacity must be set");

        let remote: CacheError = RemoteError::Transport("connection refused".to_string()).into();
        assert!(remote.to_string().contains("connection refused"));
        assert!(matches!(remote, CacheError::Remote(RemoteError::Transport(_))));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));

        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let error: CacheError = json_err.into();
        assert!(matches!(error, CacheError::Serialization(_)));
    }
}
