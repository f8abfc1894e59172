//! Strata library crate (used by the `strata` binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Chains
//! - [`ChainedLookup`], [`ChainBuilder`] - synchronous tiered lookup with backfill
//! - [`AsyncChainedLookup`] - the same contract for tiers that do I/O
//! - [`DataSource`], [`AsyncDataSource`] - one tier: lookup plus optional refresh
//! - [`LookupSource`], [`RefreshSink`] and their async twins - tier capabilities
//! - [`RefreshPolicy`] - what a failed backfill does
//!
//! ## Tiers
//! - [`MemoryCache`], [`MemoryCacheHandle`] - bounded in-memory cache
//! - [`DiskStore`] - one JSON file per key
//! - [`KeyedTier`], [`cache_key`] - `"<prefix>:<request>"` keys over a string-keyed tier
//!
//! ## Test/Mock Support
//! Recording mocks are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod chain;
pub mod config;
pub mod hashing;
pub mod storage;

pub use cache::{KeyedTier, MemoryCache, MemoryCacheHandle, cache_key};
#[cfg(any(test, feature = "mock"))]
pub use chain::{CallKind, CallLog, CallRecord, MockLookupSource, MockRefreshSink};
pub use chain::{
    AsyncChainedLookup, AsyncDataSource, AsyncLookupSource, AsyncRefreshSink, Blocking,
    ChainBuilder, ChainError, ChainLookupResult, ChainResult, ChainedLookup, DataSource,
    LookupSource, RefreshPolicy, RefreshSink, TierError, TierResult,
};
pub use config::{Config, ConfigError};
pub use hashing::{hash_key, hash_key_hex, hash_to_u64};
pub use storage::{DiskStore, StorageError};
