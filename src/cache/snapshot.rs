//! Single unkeyed snapshot of a whole collection, refreshed as a unit.
//!
//! One async mutex guards both the snapshot and the refresh, and the remote
//! call runs while it is held. Readers arriving during a refresh wait behind
//! it; in exchange a refresh can never overlap another one.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::result::{expiry_after, CacheResult};
use super::stats::{CacheStats, StatsCounters};
use crate::error::RemoteError;

struct Snapshot<V> {
  items: Option<Arc<Vec<V>>>,
  cached_at: Option<DateTime<Utc>>,
  expires_at: Option<Instant>,
}

/// Process-wide snapshot cache for a reference list.
pub struct SnapshotCache<V> {
  state: Mutex<Snapshot<V>>,
  ttl: Duration,
  /// Bumped each time a refresh finishes, so callers that queued behind a
  /// failed refresh can tell it already happened.
  completed_refreshes: AtomicU64,
  stats: StatsCounters,
}

impl<V> SnapshotCache<V> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      state: Mutex::new(Snapshot {
        items: None,
        cached_at: None,
        expires_at: None,
      }),
      ttl,
      completed_refreshes: AtomicU64::new(0),
      stats: StatsCounters::default(),
    }
  }

  pub fn stats(&self) -> CacheStats {
    self.stats.snapshot()
  }

  /// Return the snapshot, refreshing it first if it is missing or expired.
  ///
  /// Never fails: when the refresh fails the previous snapshot (or `None`)
  /// comes back with [`CacheSource::Offline`](super::CacheSource::Offline),
  /// and the expiry is left alone so the next call retries.
  pub async fn get<F, Fut>(&self, fetcher: F) -> CacheResult<Option<Arc<Vec<V>>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<V>, RemoteError>>,
  {
    let observed = self.completed_refreshes.load(Ordering::Acquire);
    let mut snapshot = self.state.lock().await;

    if let (Some(items), Some(expires_at), Some(cached_at)) =
      (&snapshot.items, snapshot.expires_at, snapshot.cached_at)
    {
      if Instant::now() <= expires_at {
        self.stats.hit();
        return CacheResult::from_cache(Some(Arc::clone(items)), cached_at, false);
      }
    }

    if self.completed_refreshes.load(Ordering::Acquire) != observed {
      // Someone refreshed while we were queued and it did not succeed.
      debug!("snapshot refresh already attempted while waiting, not retrying");
      self.stats.stale_hit();
      return CacheResult::offline(snapshot.items.clone(), snapshot.cached_at);
    }

    self.stats.refresh();
    let fetched = fetcher().await;
    self.completed_refreshes.fetch_add(1, Ordering::AcqRel);

    match fetched {
      Ok(items) => {
        let items = Arc::new(items);
        snapshot.items = Some(Arc::clone(&items));
        snapshot.cached_at = Some(Utc::now());
        snapshot.expires_at = Some(expiry_after(self.ttl));
        info!(count = items.len(), "snapshot refreshed");
        CacheResult::from_network(Some(items))
      }
      Err(err) => {
        self.stats.refresh_failed();
        warn!(
          error = %err,
          cached = snapshot.items.is_some(),
          "snapshot refresh failed"
        );
        if snapshot.items.is_some() {
          self.stats.stale_hit();
        }
        CacheResult::offline(snapshot.items.clone(), snapshot.cached_at)
      }
    }
  }
}
