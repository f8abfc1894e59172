//! Synchronous lookup chain: first hit wins, faster tiers are backfilled.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::data_source::DataSource;
use super::error::{ChainError, ChainResult};
use super::source::{LookupSource, RefreshSink};
use super::types::{ChainLookupResult, RefreshPolicy};

/// Ordered list of tiers, fastest first.
///
/// [`ChainedLookup::execute`] asks each tier in order and stops at the first
/// hit. Every tier scanned before the hit then gets the value through its
/// refresh sink, nearest to the hit first. The chain keeps no state between
/// calls; it is as thread-safe as the tiers it wraps.
pub struct ChainedLookup<R, V> {
    tiers: Vec<DataSource<R, V>>,
    refresh_policy: RefreshPolicy,
}

impl<R, V> ChainedLookup<R, V> {
    /// Creates a chain with the default [`RefreshPolicy::Isolate`].
    pub fn new(tiers: Vec<DataSource<R, V>>) -> ChainResult<Self> {
        Self::with_policy(tiers, RefreshPolicy::default())
    }

    pub fn with_policy(
        tiers: Vec<DataSource<R, V>>,
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

    pub fn builder() -> ChainBuilder<R, V> {
        ChainBuilder::new()
    }

    pub fn tiers(&self) -> &[DataSource<R, V>] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always `false`; construction rejects empty chains.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }

    /// Looks `request` up and returns the value, or `None` if every tier missed.
    pub fn execute(&self, request: &R) -> ChainResult<Option<V>> {
        self.lookup(request).map(ChainLookupResult::into_value)
    }

    /// Like [`Self::execute`], but reports which tier hit and how the backfill went.
    #[instrument(skip(self, request), fields(tiers = self.tiers.len()))]
    pub fn lookup(&self, request: &R) -> ChainResult<ChainLookupResult<V>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let found = tier
                .lookup()
                .lookup(request)
                .map_err(|source| ChainError::Lookup {
                    tier: index,
                    name: tier.name().to_string(),
                    source,
                })?;

            match found {
                Some(value) => {
                    debug!(tier = index, name = tier.name(), "chain hit");
                    let (refreshed, refresh_failures) = self.backfill(index, request, &value)?;
                    return Ok(ChainLookupResult::Hit {
                        tier: index,
                        value,
                        refreshed,
                        refresh_failures,
                    });
                }
                None => debug!(tier = index, name = tier.name(), "tier miss"),
            }
        }

        debug!("all tiers missed");
        Ok(ChainLookupResult::Miss)
    }

    fn backfill(&self, hit: usize, request: &R, value: &V) -> ChainResult<(usize, usize)> {
        let mut refreshed = 0;
        let mut failures = 0;

        for (index, tier) in self.tiers[..hit].iter().enumerate().rev() {
            let Some(sink) = tier.refresh() else {
                continue;
            };

            match sink.refresh(request, value) {
                Ok(()) => refreshed += 1,
                Err(source) => match self.refresh_policy {
                    RefreshPolicy::Isolate => {
                        warn!(
                            tier = index,
                            name = tier.name(),
                            error = %source,
                            "refresh failed, continuing"
                        );
                        failures += 1;
                    }
                    RefreshPolicy::Propagate => {
                        return Err(ChainError::Refresh {
                            tier: index,
                            name: tier.name().to_string(),
                            source,
                        });
                    }
                },
            }
        }

        Ok((refreshed, failures))
    }
}

impl<R, V> fmt::Debug for ChainedLookup<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedLookup")
            .field("tiers", &self.tiers)
            .field("refresh_policy", &self.refresh_policy)
            .finish()
    }
}

/// Fluent construction of a [`ChainedLookup`].
pub struct ChainBuilder<R, V> {
    tiers: Vec<DataSource<R, V>>,
    refresh_policy: RefreshPolicy,
}

impl<R, V> ChainBuilder<R, V> {
    pub fn new() -> Self {
        Self {
            tiers: Vec::new(),
            refresh_policy: RefreshPolicy::default(),
        }
    }

    /// Appends a tier without a refresh sink.
    pub fn tier(mut self, lookup: impl LookupSource<R, V> + 'static) -> Self {
        self.tiers.push(DataSource::new(lookup));
        self
    }

    /// Appends a tier with a refresh sink.
    pub fn tier_with_refresh(
        mut self,
        lookup: impl LookupSource<R, V> + 'static,
        refresh: impl RefreshSink<R, V> + 'static,
    ) -> Self {
        self.tiers.push(DataSource::with_refresh(lookup, refresh));
        self
    }

    /// Appends a tier whose lookup and refresh are the same shared object.
    pub fn shared_tier<T>(mut self, name: impl Into<String>, tier: Arc<T>) -> Self
    where
        T: LookupSource<R, V> + RefreshSink<R, V> + 'static,
    {
        let lookup: Arc<dyn LookupSource<R, V>> = tier.clone();
        let refresh: Arc<dyn RefreshSink<R, V>> = tier;
        self.tiers
            .push(DataSource::from_arcs(lookup, Some(refresh)).named(name));
        self
    }

    /// Appends a prepared tier.
    pub fn data_source(mut self, tier: DataSource<R, V>) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    pub fn build(self) -> ChainResult<ChainedLookup<R, V>> {
        ChainedLookup::with_policy(self.tiers, self.refresh_policy)
    }
}

impl<R, V> Default for ChainBuilder<R, V> {
    fn default() -> Self {
        Self::new()
    }
}
