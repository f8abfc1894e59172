//! Cache tiers: bounded in-memory cache and prefixed string keys.

pub mod keyed;
pub mod memory;


pub use keyed::{KeyedTier, cache_key};
pub use memory::{MemoryCache, MemoryCacheHandle};
