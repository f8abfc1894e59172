use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
/// Errors raised by a single tier's lookup or refresh.
///
/// A missing value is never an error; tiers report it as `Ok(None)`.
pub enum TierError {
    /// The request cannot be served by this tier (bad key, wrong shape).
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Error message.
        reason: String,
    },

    /// The backing store could not be reached.
    #[error("tier unavailable: {reason}")]
    Unavailable {
        /// Error message.
        reason: String,
    },

    /// Disk store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Any other implementation-defined failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TierError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result type returned by tier implementations.
pub type TierResult<T> = Result<T, TierError>;

#[derive(Debug, Error)]
/// Errors returned by [`crate::chain::ChainedLookup`] and its async twin.
pub enum ChainError {
    /// A chain needs at least one tier.
    #[error("a lookup chain requires at least one tier")]
    EmptyChain,

    /// A tier's lookup failed; the scan stopped at this tier.
    #[error("lookup failed at tier {tier} ({name}): {source}")]
    Lookup {
        /// Zero-based tier index.
        tier: usize,
        /// Tier name.
        name: String,
        #[source]
        source: TierError,
    },

    /// A refresh sink failed while [`crate::chain::RefreshPolicy::Propagate`] was active.
    #[error("refresh failed at tier {tier} ({name}): {source}")]
    Refresh {
        /// Zero-based tier index.
        tier: usize,
        /// Tier name.
        name: String,
        #[source]
        source: TierError,
    },
}

impl ChainError {
    /// Returns the index of the failing tier, if any.
    pub fn tier(&self) -> Option<usize> {
        match self {
            ChainError::EmptyChain => None,
            ChainError::Lookup { tier, .. } | ChainError::Refresh { tier, .. } => Some(*tier),
        }
    }
}

/// Convenience result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
