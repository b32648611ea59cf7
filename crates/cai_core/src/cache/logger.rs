//! Call/hit/miss observations for the cache-aside handler.
//!
//! Observations are a side channel: they are logged and counted, and never
//! influence what the handler reads or writes.

use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of handler observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Uncached calls (writes) passed to the inner repository.
    pub calls: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Hit ratio over all cached reads, `0.0` when nothing was read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Logs and counts persistence activity seen by the cache layer.
#[derive(Debug, Default)]
pub struct PersistenceLogger {
    calls: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PersistenceLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a write-path call. `args` is a preformatted `key=value` list.
    pub fn log_call(&self, method: &str, args: &str) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        debug!("event=persistence_call module=cache method={method} {args}");
    }

    pub fn log_cache_hit(&self, key: &str) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        trace!("event=cache_lookup module=cache status=hit key={key}");
    }

    pub fn log_cache_miss(&self, key: &str) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("event=cache_lookup module=cache status=miss key={key}");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            calls: self.calls.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
