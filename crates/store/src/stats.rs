//! Decision counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Resolutions answered with the default role
    pub fallback_resolutions: u64,
    /// Permission checks that found no matching tenant pattern
    pub denials: u64,
    /// Grants skipped because the pattern did not compile
    pub dropped_patterns: u64,
}

/// Counters updated outside the state lock
#[derive(Debug, Default)]
pub(crate) struct DecisionCounters {
    fallback_resolutions: AtomicU64,
    denials: AtomicU64,
    dropped_patterns: AtomicU64,
}

impl DecisionCounters {
    pub(crate) fn record_fallback(&self) {
        self.fallback_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denial(&self) {
        self.denials.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_pattern(&self) {
        self.dropped_patterns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StoreStats {
        StoreStats {
            fallback_resolutions: self.fallback_resolutions.load(Ordering::Relaxed),
            denials: self.denials.load(Ordering::Relaxed),
            dropped_patterns: self.dropped_patterns.load(Ordering::Relaxed),
        }
    }
}
