//! Bounded in-memory cache tier.
//!
//! Backed by `moka::sync::Cache`, which is safe to share across threads; a
//! [`MemoryCacheHandle`] is the clonable form handed to chain tiers.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;

use crate::chain::{AsyncLookupSource, AsyncRefreshSink, LookupSource, RefreshSink, TierResult};

/// In-memory cache with LRU-style eviction and optional time-to-live.
pub struct MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    entries: Cache<K, V>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    /// Creates a cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a cache with a max entry capacity.
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Creates a cache whose entries expire `ttl` after insertion.
    pub fn with_ttl(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key)
    }

    /// Returns the entries present for `keys`; missing keys are left out.
    pub fn multi_get<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> HashMap<K, V>
    where
        K: Clone + 'a,
    {
        keys.into_iter()
            .filter_map(|key| self.entries.get(key).map(|value| (key.clone(), value)))
            .collect()
    }

    #[inline]
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    #[inline]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of cached entries.
    ///
    /// The count is approximate until [`Self::run_pending_tasks`] has run.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl<K, V> LookupSource<K, V> for MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[inline]
    fn lookup(&self, request: &K) -> TierResult<Option<V>> {
        Ok(self.get(request))
    }
}

impl<K, V> RefreshSink<K, V> for MemoryCache<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[inline]
    fn refresh(&self, request: &K, value: &V) -> TierResult<()> {
        self.insert(request.clone(), value.clone());
        Ok(())
    }
}

/// Shared handle to a [`MemoryCache`].
pub struct MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<MemoryCache<K, V>>,
}

impl<K, V> MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[inline]
    pub fn new() -> Self {
        Self::from_cache(MemoryCache::new())
    }

    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self::from_cache(MemoryCache::with_capacity(capacity))
    }

    #[inline]
    pub fn from_cache(cache: MemoryCache<K, V>) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    #[inline]
    pub fn cache(&self) -> &MemoryCache<K, V> {
        &self.inner
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    #[inline]
    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    #[inline]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn clear(&self) {
        self.inner.clear();
    }

    #[inline]
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }

    /// Returns the number of strong references to the underlying cache.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<K, V> Clone for MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheHandle")
            .field("strong_count", &self.strong_count())
            .finish()
    }
}

impl<K, V> LookupSource<K, V> for MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[inline]
    fn lookup(&self, request: &K) -> TierResult<Option<V>> {
        Ok(self.get(request))
    }
}

impl<K, V> RefreshSink<K, V> for MemoryCacheHandle<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[inline]
    fn refresh(&self, request: &K, value: &V) -> TierResult<()> {
        self.insert(request.clone(), value.clone());
        Ok(())
    }
}

#[async_trait]
impl<K, V> AsyncLookupSource<K, V> for MemoryCacheHandle<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, request: &K) -> TierResult<Option<V>> {
        Ok(self.get(request))
    }
}

#[async_trait]
impl<K, V> AsyncRefreshSink<K, V> for MemoryCacheHandle<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn refresh(&self, request: &K, value: &V) -> TierResult<()> {
        self.insert(request.clone(), value.clone());
        Ok(())
    }
}
