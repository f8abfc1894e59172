//! Tiered lookup chains with write-back refresh.
//!
//! A chain is an ordered list of [`DataSource`]s, fastest first. A lookup
//! walks the tiers until one of them returns a value; every tier it walked
//! past is then refreshed with that value, starting with the tier next to the
//! hit and ending with the fastest one.

pub mod chained;
pub mod data_source;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod nonblocking;
pub mod source;
pub mod types;

#[cfg(test)]
mod tests;

pub use chained::{ChainBuilder, ChainedLookup};
pub use data_source::{DEFAULT_TIER_NAME, DataSource};
pub use error::{ChainError, ChainResult, TierError, TierResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{CallKind, CallLog, CallRecord, MockLookupSource, MockRefreshSink};
pub use nonblocking::{
    AsyncChainedLookup, AsyncDataSource, AsyncLookupSource, AsyncRefreshSink, Blocking,
};
pub use source::{LookupSource, RefreshSink};
pub use types::{ChainLookupResult, RefreshPolicy};
