//! Result and entry types shared by the cache policies.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>, is_stale: bool) -> Self {
    Self {
      data,
      source: if is_stale {
        CacheSource::CacheStale
      } else {
        CacheSource::CacheFresh
      },
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for a failed refresh that fell back to cached data.
  pub fn offline(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Data from cache past its TTL, served while another caller refreshes it
  CacheStale,
  /// Refresh failed, serving whatever was cached (possibly nothing)
  Offline,
}

/// Longest TTL honoured. Longer TTLs are clamped so the deadline stays
/// representable as an [`Instant`].
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Deadline `ttl` from now, clamped to [`MAX_TTL`].
pub(crate) fn expiry_after(ttl: Duration) -> Instant {
  Instant::now() + ttl.min(MAX_TTL)
}

/// Freshness of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
  Fresh,
  Stale,
  Refreshing,
}

/// A cached value with its expiry deadline.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
  pub value: V,
  pub cached_at: DateTime<Utc>,
  pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
  pub fn new(value: V, ttl: Duration) -> Self {
    Self {
      value,
      cached_at: Utc::now(),
      expires_at: expiry_after(ttl),
    }
  }

  pub fn is_fresh(&self, now: Instant) -> bool {
    now < self.expires_at
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_entry_goes_stale_at_deadline() {
    let entry = CacheEntry::new("value", Duration::from_millis(100));
    assert!(entry.is_fresh(Instant::now()));

    tokio::time::advance(Duration::from_millis(99)).await;
    assert!(entry.is_fresh(Instant::now()));

    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(!entry.is_fresh(Instant::now()));
  }

  #[tokio::test(start_paused = true)]
  async fn test_huge_ttl_is_clamped() {
    let entry = CacheEntry::new("value", Duration::MAX);
    assert_eq!(entry.expires_at, Instant::now() + MAX_TTL);

    tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
    assert!(entry.is_fresh(Instant::now()));
  }
}
