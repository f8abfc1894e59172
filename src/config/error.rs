//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// In-memory capacity must be at least 1.
    #[error("invalid L1 capacity '{value}': must be greater than 0")]
    InvalidCapacity { value: String },

    /// Capacity string could not be parsed as a number.
    #[error("failed to parse L1 capacity '{value}': {source}")]
    CapacityParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// TTL must be at least one second.
    #[error("invalid L1 TTL '{value}': must be greater than 0 seconds")]
    InvalidTtl { value: String },

    /// TTL string could not be parsed as whole seconds.
    #[error("failed to parse L1 TTL '{value}': {source}")]
    TtlParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("invalid refresh policy '{value}': expected 'isolate' or 'propagate'")]
    InvalidRefreshPolicy { value: String },

    /// Key prefixes are joined with ':' and so cannot be empty or contain one.
    #[error("invalid key prefix '{value}': must be non-empty and contain no ':'")]
    InvalidKeyPrefix { value: String },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
