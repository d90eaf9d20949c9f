//! Hit/refresh/eviction counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
  hits: AtomicU64,
  stale_hits: AtomicU64,
  refreshes: AtomicU64,
  refresh_failures: AtomicU64,
  evictions: AtomicU64,
}

impl StatsCounters {
  pub fn hit(&self) {
    self.hits.fetch_add(1, Ordering::Relaxed);
  }

  pub fn stale_hit(&self) {
    self.stale_hits.fetch_add(1, Ordering::Relaxed);
  }

  pub fn refresh(&self) {
    self.refreshes.fetch_add(1, Ordering::Relaxed);
  }

  pub fn refresh_failed(&self) {
    self.refresh_failures.fetch_add(1, Ordering::Relaxed);
  }

  pub fn evicted(&self) {
    self.evictions.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> CacheStats {
    CacheStats {
      hits: self.hits.load(Ordering::Relaxed),
      stale_hits: self.stale_hits.load(Ordering::Relaxed),
      refreshes: self.refreshes.load(Ordering::Relaxed),
      refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
      evictions: self.evictions.load(Ordering::Relaxed),
    }
  }
}

/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
  /// Fresh values served without a remote call
  pub hits: u64,
  /// Expired values served (refresh in flight or refresh failed)
  pub stale_hits: u64,
  /// Remote calls issued
  pub refreshes: u64,
  pub refresh_failures: u64,
  pub evictions: u64,
}
