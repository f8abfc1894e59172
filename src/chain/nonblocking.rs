//! Async lookup chain for tiers that do I/O.
//!
//! Same contract as [`super::ChainedLookup`]: tiers are awaited one after the
//! other, the first hit stops the scan and the skipped-over tiers are
//! backfilled nearest-first. Nothing is spawned; the whole lookup is a single
//! sequential future.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::data_source::DEFAULT_TIER_NAME;
use super::error::{ChainError, ChainResult, TierResult};
use super::source::{LookupSource, RefreshSink};
use super::types::{ChainLookupResult, RefreshPolicy};

#[async_trait]
/// Async counterpart of [`LookupSource`].
pub trait AsyncLookupSource<R, V>: Send + Sync
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn lookup(&self, request: &R) -> TierResult<Option<V>>;
}

#[async_trait]
/// Async counterpart of [`RefreshSink`].
pub trait AsyncRefreshSink<R, V>: Send + Sync
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn refresh(&self, request: &R, value: &V) -> TierResult<()>;
}

/// Runs a synchronous tier inside an async chain.
///
/// The wrapped tier is called inline, so it should be cheap (an in-memory
/// cache, not a disk read).
#[derive(Debug, Clone)]
pub struct Blocking<T>(pub T);

#[async_trait]
impl<R, V, T> AsyncLookupSource<R, V> for Blocking<T>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: LookupSource<R, V>,
{
    async fn lookup(&self, request: &R) -> TierResult<Option<V>> {
        self.0.lookup(request)
    }
}

#[async_trait]
impl<R, V, T> AsyncRefreshSink<R, V> for Blocking<T>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: RefreshSink<R, V>,
{
    async fn refresh(&self, request: &R, value: &V) -> TierResult<()> {
        self.0.refresh(request, value)
    }
}

/// One link of an [`AsyncChainedLookup`].
pub struct AsyncDataSource<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    name: String,
    lookup: Arc<dyn AsyncLookupSource<R, V>>,
    refresh: Option<Arc<dyn AsyncRefreshSink<R, V>>>,
}

impl<R, V> AsyncDataSource<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(lookup: impl AsyncLookupSource<R, V> + 'static) -> Self {
        Self::from_arcs(Arc::new(lookup), None)
    }

    pub fn with_refresh(
        lookup: impl AsyncLookupSource<R, V> + 'static,
        refresh: impl AsyncRefreshSink<R, V> + 'static,
    ) -> Self {
        Self::from_arcs(Arc::new(lookup), Some(Arc::new(refresh)))
    }

    /// Creates a tier whose lookup and refresh are the same shared object.
    pub fn shared<T>(tier: Arc<T>) -> Self
    where
        T: AsyncLookupSource<R, V> + AsyncRefreshSink<R, V> + 'static,
    {
        let lookup: Arc<dyn AsyncLookupSource<R, V>> = tier.clone();
        let refresh: Arc<dyn AsyncRefreshSink<R, V>> = tier;
        Self::from_arcs(lookup, Some(refresh))
    }

    pub fn from_arcs(
        lookup: Arc<dyn AsyncLookupSource<R, V>>,
        refresh: Option<Arc<dyn AsyncRefreshSink<R, V>>>,
    ) -> Self {
        Self {
            name: DEFAULT_TIER_NAME.to_string(),
            lookup,
            refresh,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookup(&self) -> &Arc<dyn AsyncLookupSource<R, V>> {
        &self.lookup
    }

    pub fn refresh(&self) -> Option<&Arc<dyn AsyncRefreshSink<R, V>>> {
        self.refresh.as_ref()
    }

    pub fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

#[cfg(any(test, feature = "mock"))]
impl<R, V> AsyncDataSource<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Swaps the lookup source (test doubles only).
    pub fn set_lookup(&mut self, lookup: Arc<dyn AsyncLookupSource<R, V>>) {
        self.lookup = lookup;
    }

    /// Swaps or clears the refresh sink (test doubles only).
    pub fn set_refresh(&mut self, refresh: Option<Arc<dyn AsyncRefreshSink<R, V>>>) {
        self.refresh = refresh;
    }
}

impl<R, V> fmt::Debug for AsyncDataSource<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDataSource")
            .field("name", &self.name)
            .field("has_refresh", &self.refresh.is_some())
            .finish()
    }
}

/// Async ordered list of tiers, fastest first.
pub struct AsyncChainedLookup<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    tiers: Vec<AsyncDataSource<R, V>>,
    refresh_policy: RefreshPolicy,
}

impl<R, V> AsyncChainedLookup<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(tiers: Vec<AsyncDataSource<R, V>>) -> ChainResult<Self> {
        Self::with_policy(tiers, RefreshPolicy::default())
    }

    pub fn with_policy(
        tiers: Vec<AsyncDataSource<R, V>>,
        refresh_policy: RefreshPolicy,
    ) -> ChainResult<Self> {
        if tiers.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        Ok(Self {
            tiers,
            refresh_policy,
        })
    }

    pub fn tiers(&self) -> &[AsyncDataSource<R, V>] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }

    pub async fn execute(&self, request: &R) -> ChainResult<Option<V>> {
        self.lookup(request)
            .await
            .map(ChainLookupResult::into_value)
    }

    #[instrument(skip(self, request), fields(tiers = self.tiers.len()))]
    pub async fn lookup(&self, request: &R) -> ChainResult<ChainLookupResult<V>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let found =
                tier.lookup()
                    .lookup(request)
                    .await
                    .map_err(|source| ChainError::Lookup {
                        tier: index,
                        name: tier.name().to_string(),
                        source,
                    })?;

            if let Some(value) = found {
                debug!(tier = index, name = tier.name(), "chain hit");
                let (refreshed, refresh_failures) = self.backfill(index, request, &value).await?;
                return Ok(ChainLookupResult::Hit {
                    tier: index,
                    value,
                    refreshed,
                    refresh_failures,
                });
            }
            debug!(tier = index, name = tier.name(), "tier miss");
        }

        debug!("all tiers missed");
        Ok(ChainLookupResult::Miss)
    }

    async fn backfill(&self, hit: usize, request: &R, value: &V) -> ChainResult<(usize, usize)> {
        let mut refreshed = 0;
        let mut failures = 0;

        for (index, tier) in self.tiers[..hit].iter().enumerate().rev() {
            let Some(sink) = tier.refresh() else {
                continue;
            };

            if let Err(source) = sink.refresh(request, value).await {
                if self.refresh_policy == RefreshPolicy::Propagate {
                    return Err(ChainError::Refresh {
                        tier: index,
                        name: tier.name().to_string(),
                        source,
                    });
                }
                warn!(
                    tier = index,
                    name = tier.name(),
                    error = %source,
                    "refresh failed, continuing"
                );
                failures += 1;
            } else {
                refreshed += 1;
            }
        }

        Ok((refreshed, failures))
    }
}

impl<R, V> fmt::Debug for AsyncChainedLookup<R, V>
where
    R: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncChainedLookup")
            .field("tiers", &self.tiers)
            .field("refresh_policy", &self.refresh_policy)
            .finish()
    }
}
