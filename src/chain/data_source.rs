//! One link of a lookup chain: a lookup source plus an optional refresh sink.

use std::fmt;
use std::sync::Arc;

use super::source::{LookupSource, RefreshSink};

/// Tier name used when none is given.
pub const DEFAULT_TIER_NAME: &str = "tier";

/// Binds one [`LookupSource`] to zero or one [`RefreshSink`].
///
/// Holds no state and performs no work itself; [`super::ChainedLookup`] drives it.
pub struct DataSource<R, V> {
    name: String,
    lookup: Arc<dyn LookupSource<R, V>>,
    refresh: Option<Arc<dyn RefreshSink<R, V>>>,
}

impl<R, V> DataSource<R, V> {
    /// Creates a tier that is never backfilled.
    pub fn new(lookup: impl LookupSource<R, V> + 'static) -> Self {
        Self::from_arcs(Arc::new(lookup), None)
    }

    /// Creates a tier that is backfilled through `refresh` when a slower tier hits.
    pub fn with_refresh(
        lookup: impl LookupSource<R, V> + 'static,
        refresh: impl RefreshSink<R, V> + 'static,
    ) -> Self {
        Self::from_arcs(Arc::new(lookup), Some(Arc::new(refresh)))
    }

    /// Creates a tier from shared trait objects.
    ///
    /// Use this when one object serves as both lookup and refresh, or is shared
    /// across several chains.
    pub fn from_arcs(
        lookup: Arc<dyn LookupSource<R, V>>,
        refresh: Option<Arc<dyn RefreshSink<R, V>>>,
    ) -> Self {
        Self {
            name: DEFAULT_TIER_NAME.to_string(),
            lookup,
            refresh,
        }
    }

    /// Sets the name reported in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookup(&self) -> &Arc<dyn LookupSource<R, V>> {
        &self.lookup
    }

    pub fn refresh(&self) -> Option<&Arc<dyn RefreshSink<R, V>>> {
        self.refresh.as_ref()
    }

    pub fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

#[cfg(any(test, feature = "mock"))]
impl<R, V> DataSource<R, V> {
    /// Swaps the lookup source (test doubles only).
    pub fn set_lookup(&mut self, lookup: Arc<dyn LookupSource<R, V>>) {
        self.lookup = lookup;
    }

    /// Swaps or clears the refresh sink (test doubles only).
    pub fn set_refresh(&mut self, refresh: Option<Arc<dyn RefreshSink<R, V>>>) {
        self.refresh = refresh;
    }
}

impl<R, V> Clone for DataSource<R, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            lookup: Arc::clone(&self.lookup),
            refresh: self.refresh.clone(),
        }
    }
}

impl<R, V> fmt::Debug for DataSource<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("has_refresh", &self.has_refresh())
            .finish()
    }
}
