use std::fmt;
use std::str::FromStr;

/// What a chain does when a refresh sink fails during backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefreshPolicy {
    /// Log the failure, keep refreshing the remaining tiers, return the value.
    #[default]
    Isolate,
    /// Stop the refresh pass and return the failure to the caller.
    Propagate,
}

impl RefreshPolicy {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshPolicy::Isolate => "isolate",
            RefreshPolicy::Propagate => "propagate",
        }
    }
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(RefreshPolicy::Isolate),
            "propagate" => Ok(RefreshPolicy::Propagate),
            other => Err(other.to_string()),
        }
    }
}

/// Outcome of a chain lookup, with the bookkeeping of the refresh pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainLookupResult<V> {
    Hit {
        /// Index of the tier that produced the value.
        tier: usize,
        value: V,
        /// Number of refresh sinks that completed successfully.
        refreshed: usize,
        /// Number of refresh sinks that failed (only under `Isolate`).
        refresh_failures: usize,
    },
    Miss,
}

impl<V> ChainLookupResult<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, ChainLookupResult::Hit { .. })
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, ChainLookupResult::Miss)
    }

    /// Index of the tier that hit.
    pub fn tier(&self) -> Option<usize> {
        match self {
            ChainLookupResult::Hit { tier, .. } => Some(*tier),
            ChainLookupResult::Miss => None,
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            ChainLookupResult::Hit { value, .. } => Some(value),
            ChainLookupResult::Miss => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            ChainLookupResult::Hit { value, .. } => Some(value),
            ChainLookupResult::Miss => None,
        }
    }

    pub fn refreshed(&self) -> usize {
        match self {
            ChainLookupResult::Hit { refreshed, .. } => *refreshed,
            ChainLookupResult::Miss => 0,
        }
    }

    pub fn refresh_failures(&self) -> usize {
        match self {
            ChainLookupResult::Hit {
                refresh_failures, ..
            } => *refresh_failures,
            ChainLookupResult::Miss => 0,
        }
    }
}
