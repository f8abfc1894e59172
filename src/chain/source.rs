//! The two capabilities a tier can provide: lookup and refresh.

use super::error::TierResult;

/// Reads a value for a request from one tier.
///
/// Return `Ok(None)` when the tier does not hold the value; reserve `Err` for
/// malformed requests and infrastructure failures.
pub trait LookupSource<R, V>: Send + Sync {
    fn lookup(&self, request: &R) -> TierResult<Option<V>>;
}

/// Writes a value found further down the chain back into this tier.
///
/// May be called with a value the tier already holds, so writes must be
/// idempotent.
pub trait RefreshSink<R, V>: Send + Sync {
    fn refresh(&self, request: &R, value: &V) -> TierResult<()>;
}

impl<R, V, F> LookupSource<R, V> for F
where
    F: Fn(&R) -> TierResult<Option<V>> + Send + Sync,
{
    #[inline]
    fn lookup(&self, request: &R) -> TierResult<Option<V>> {
        self(request)
    }
}

impl<R, V, F> RefreshSink<R, V> for F
where
    F: Fn(&R, &V) -> TierResult<()> + Send + Sync,
{
    #[inline]
    fn refresh(&self, request: &R, value: &V) -> TierResult<()> {
        self(request, value)
    }
}
