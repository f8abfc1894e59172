//! Prefixed string keys for shared caches.
//!
//! Several entity types can share one string-keyed store when each request
//! is turned into `"<prefix>:<request>"`, e.g. `Person:42` and `Group:42`.

use std::fmt::Display;

use async_trait::async_trait;

use crate::chain::{AsyncLookupSource, AsyncRefreshSink, LookupSource, RefreshSink, TierResult};

/// Builds the cache key for `request` under `prefix`.
#[inline]
pub fn cache_key(prefix: &str, request: impl Display) -> String {
    if prefix.is_empty() {
        request.to_string()
    } else {
        format!("{}:{}", prefix, request)
    }
}

/// Adapts a `String`-keyed tier to any `Display` request type.
#[derive(Debug, Clone)]
pub struct KeyedTier<T> {
    prefix: String,
    inner: T,
}

impl<T> KeyedTier<T> {
    pub fn new(prefix: impl Into<String>, inner: T) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    #[inline]
    pub fn key_for(&self, request: &impl Display) -> String {
        cache_key(&self.prefix, request)
    }
}

impl<R, V, T> LookupSource<R, V> for KeyedTier<T>
where
    R: Display,
    T: LookupSource<String, V>,
{
    fn lookup(&self, request: &R) -> TierResult<Option<V>> {
        self.inner.lookup(&self.key_for(request))
    }
}

impl<R, V, T> RefreshSink<R, V> for KeyedTier<T>
where
    R: Display,
    T: RefreshSink<String, V>,
{
    fn refresh(&self, request: &R, value: &V) -> TierResult<()> {
        self.inner.refresh(&self.key_for(request), value)
    }
}

#[async_trait]
impl<R, V, T> AsyncLookupSource<R, V> for KeyedTier<T>
where
    R: Display + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: AsyncLookupSource<String, V>,
{
    async fn lookup(&self, request: &R) -> TierResult<Option<V>> {
        let key = self.key_for(request);
        self.inner.lookup(&key).await
    }
}

#[async_trait]
impl<R, V, T> AsyncRefreshSink<R, V> for KeyedTier<T>
where
    R: Display + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: AsyncRefreshSink<String, V>,
{
    async fn refresh(&self, request: &R, value: &V) -> TierResult<()> {
        let key = self.key_for(request);
        self.inner.refresh(&key, value).await
    }
}
