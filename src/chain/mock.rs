//! Recording test doubles for chain tiers.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{TierError, TierResult};
use super::nonblocking::{AsyncLookupSource, AsyncRefreshSink};
use super::source::{LookupSource, RefreshSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Lookup,
    Refresh,
}

/// One recorded call against a mock tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord<R, V> {
    pub tier: String,
    pub kind: CallKind,
    pub request: R,
    /// The refreshed value (refresh calls only).
    pub value: Option<V>,
}

/// Call log shared by every mock in a chain, in call order.
#[derive(Debug)]
pub struct CallLog<R, V> {
    records: Arc<Mutex<Vec<CallRecord<R, V>>>>,
}

impl<R, V> Clone for CallLog<R, V> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<R, V> Default for CallLog<R, V> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<R: Clone, V: Clone> CallLog<R, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: CallRecord<R, V>) {
        self.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<CallRecord<R, V>> {
        self.records.lock().clone()
    }

    /// Names of the tiers that saw a lookup, in order.
    pub fn lookup_order(&self) -> Vec<String> {
        self.names_of(CallKind::Lookup)
    }

    /// Names of the tiers that saw a refresh, in order.
    pub fn refresh_order(&self) -> Vec<String> {
        self.names_of(CallKind::Refresh)
    }

    pub fn refreshes(&self) -> Vec<CallRecord<R, V>> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind == CallKind::Refresh)
            .cloned()
            .collect()
    }

    pub fn count(&self, tier: &str, kind: CallKind) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind == kind && r.tier == tier)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn names_of(&self, kind: CallKind) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.tier.clone())
            .collect()
    }
}

/// Lookup source that answers from a fixed value and/or a per-request table.
pub struct MockLookupSource<R, V> {
    name: String,
    fixed: Option<V>,
    entries: Mutex<HashMap<R, V>>,
    failure: Option<String>,
    log: CallLog<R, V>,
}

impl<R, V> MockLookupSource<R, V>
where
    R: Clone + Eq + Hash,
    V: Clone,
{
    /// A tier that holds nothing.
    pub fn empty(name: &str, log: &CallLog<R, V>) -> Self {
        Self {
            name: name.to_string(),
            fixed: None,
            entries: Mutex::new(HashMap::new()),
            failure: None,
            log: log.clone(),
        }
    }

    /// A tier that answers every request with `value`.
    pub fn returning(name: &str, value: V, log: &CallLog<R, V>) -> Self {
        Self {
            fixed: Some(value),
            ..Self::empty(name, log)
        }
    }

    /// A tier whose every lookup fails.
    pub fn failing(name: &str, reason: &str, log: &CallLog<R, V>) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::empty(name, log)
        }
    }

    /// Adds a per-request answer, taking precedence over the fixed value.
    pub fn with_entry(self, request: R, value: V) -> Self {
        self.entries.lock().insert(request, value);
        self
    }

    pub fn insert(&self, request: R, value: V) {
        self.entries.lock().insert(request, value);
    }

    fn answer(&self, request: &R) -> TierResult<Option<V>> {
        self.log.push(CallRecord {
            tier: self.name.clone(),
            kind: CallKind::Lookup,
            request: request.clone(),
            value: None,
        });

        if let Some(reason) = &self.failure {
            return Err(TierError::unavailable(reason.clone()));
        }

        Ok(self
            .entries
            .lock()
            .get(request)
            .cloned()
            .or_else(|| self.fixed.clone()))
    }
}

impl<R, V> LookupSource<R, V> for MockLookupSource<R, V>
where
    R: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn lookup(&self, request: &R) -> TierResult<Option<V>> {
        self.answer(request)
    }
}

#[async_trait]
impl<R, V> AsyncLookupSource<R, V> for MockLookupSource<R, V>
where
    R: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, request: &R) -> TierResult<Option<V>> {
        self.answer(request)
    }
}

/// Refresh sink that records its calls and optionally fails.
pub struct MockRefreshSink<R, V> {
    name: String,
    failure: Option<String>,
    log: CallLog<R, V>,
}

impl<R: Clone, V: Clone> MockRefreshSink<R, V> {
    pub fn new(name: &str, log: &CallLog<R, V>) -> Self {
        Self {
            name: name.to_string(),
            failure: None,
            log: log.clone(),
        }
    }

    /// A sink whose every refresh fails (after being recorded).
    pub fn failing(name: &str, reason: &str, log: &CallLog<R, V>) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new(name, log)
        }
    }

    fn record(&self, request: &R, value: &V) -> TierResult<()> {
        self.log.push(CallRecord {
            tier: self.name.clone(),
            kind: CallKind::Refresh,
            request: request.clone(),
            value: Some(value.clone()),
        });

        match &self.failure {
            Some(reason) => Err(TierError::unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl<R, V> RefreshSink<R, V> for MockRefreshSink<R, V>
where
    R: Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn refresh(&self, request: &R, value: &V) -> TierResult<()> {
        self.record(request, value)
    }
}

#[async_trait]
impl<R, V> AsyncRefreshSink<R, V> for MockRefreshSink<R, V>
where
    R: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn refresh(&self, request: &R, value: &V) -> TierResult<()> {
        self.record(request, value)
    }
}
