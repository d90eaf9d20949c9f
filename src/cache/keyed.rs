//! Keyed cache: one entry per (requester, item), bounded by least-recently-used eviction.
//!
//! At most one remote fetch runs per key. While it runs, callers that already
//! have a value for the key get that (stale) value back immediately; callers
//! with nothing cached wait for the in-flight fetch and share its outcome.

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::result::{CacheEntry, CacheResult, EntryState};
use super::stats::{CacheStats, StatsCounters};
use crate::error::{require_non_empty, ProviderError, RemoteError};

/// How a "not found" answer from the remote service is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotFoundPolicy {
  /// Return the negative result uncached. An entry already held for the key is dropped.
  #[default]
  PassThrough,
  /// Cache the negative result for the regular TTL.
  Cache,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
  requester: String,
  item: String,
}

type Outcome<V> = Result<CacheResult<Option<V>>, RemoteError>;
type OutcomeSlot<V> = Option<Outcome<V>>;

struct State<V> {
  entries: LruCache<EntryKey, CacheEntry<Option<V>>>,
  in_flight: HashMap<EntryKey, watch::Receiver<OutcomeSlot<V>>>,
}

enum Begin<V> {
  Ready(CacheResult<Option<V>>),
  Wait(watch::Receiver<OutcomeSlot<V>>),
  Lead(watch::Sender<OutcomeSlot<V>>),
}

/// Marks a key as refreshing for as long as the leading caller holds it.
///
/// If the leader is dropped before settling, the marker is cleared and the
/// sender goes away, so waiters wake up and retry.
struct InFlight<'a, V> {
  state: &'a Mutex<State<V>>,
  key: &'a EntryKey,
  tx: Option<watch::Sender<OutcomeSlot<V>>>,
}

impl<V> Drop for InFlight<'_, V> {
  fn drop(&mut self) {
    if self.tx.is_some() {
      self.state.lock().in_flight.remove(self.key);
    }
  }
}

/// Bounded per-key cache in front of a remote lookup.
pub struct KeyedCache<V> {
  state: Mutex<State<V>>,
  ttl: Duration,
  not_found: NotFoundPolicy,
  stats: StatsCounters,
}

impl<V> KeyedCache<V>
where
  V: Clone + Send + Sync,
{
  pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
    Self {
      state: Mutex::new(State {
        entries: LruCache::new(capacity),
        in_flight: HashMap::new(),
      }),
      ttl,
      not_found: NotFoundPolicy::default(),
      stats: StatsCounters::default(),
    }
  }

  pub fn with_not_found_policy(mut self, policy: NotFoundPolicy) -> Self {
    self.not_found = policy;
    self
  }

  pub fn capacity(&self) -> usize {
    self.state.lock().entries.cap().get()
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn len(&self) -> usize {
    self.state.lock().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn stats(&self) -> CacheStats {
    self.stats.snapshot()
  }

  /// Freshness of the entry for a key, without counting as a use.
  pub fn entry_state(&self, requester: &str, item: &str) -> Option<EntryState> {
    let key = EntryKey {
      requester: requester.to_string(),
      item: item.to_string(),
    };
    let state = self.state.lock();
    let entry = state.entries.peek(&key)?;

    if state.in_flight.contains_key(&key) {
      Some(EntryState::Refreshing)
    } else if entry.is_fresh(Instant::now()) {
      Some(EntryState::Fresh)
    } else {
      Some(EntryState::Stale)
    }
  }

  /// Look up a value, calling `fetcher` only when nothing fresh is cached.
  ///
  /// `Ok` with `data: None` is the remote service's "not found". An error is
  /// returned only for invalid arguments, or when the fetch failed and
  /// nothing was cached for the key.
  pub async fn lookup<F, Fut>(
    &self,
    requester: &str,
    item: &str,
    fetcher: F,
  ) -> Result<CacheResult<Option<V>>, ProviderError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<V>, RemoteError>>,
  {
    require_non_empty("requester", requester)?;
    require_non_empty("item id", item)?;

    let key = EntryKey {
      requester: requester.to_string(),
      item: item.to_string(),
    };

    loop {
      match self.begin(&key) {
        Begin::Ready(result) => return Ok(result),
        Begin::Lead(tx) => {
          return self
            .refresh(&key, tx, fetcher)
            .await
            .map_err(|source| unavailable(&key, source));
        }
        Begin::Wait(rx) => {
          debug!(requester = %key.requester, item = %key.item, "waiting for in-flight refresh");
          if let Some(outcome) = wait_for_leader(rx).await {
            return outcome.map_err(|source| unavailable(&key, source));
          }
          // Leader went away without an answer; start over.
        }
      }
    }
  }

  fn begin(&self, key: &EntryKey) -> Begin<V> {
    let mut state = self.state.lock();
    let now = Instant::now();
    let refreshing = state.in_flight.get(key).cloned();

    if let Some(entry) = state.entries.get(key) {
      if entry.is_fresh(now) {
        self.stats.hit();
        return Begin::Ready(CacheResult::from_cache(
          entry.value.clone(),
          entry.cached_at,
          false,
        ));
      }
      if refreshing.is_some() {
        self.stats.stale_hit();
        return Begin::Ready(CacheResult::from_cache(
          entry.value.clone(),
          entry.cached_at,
          true,
        ));
      }
    }

    if let Some(rx) = refreshing {
      return Begin::Wait(rx);
    }

    let (tx, rx) = watch::channel(None);
    state.in_flight.insert(key.clone(), rx);
    Begin::Lead(tx)
  }

  async fn refresh<F, Fut>(
    &self,
    key: &EntryKey,
    tx: watch::Sender<OutcomeSlot<V>>,
    fetcher: F,
  ) -> Outcome<V>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<V>, RemoteError>>,
  {
    let mut in_flight = InFlight {
      state: &self.state,
      key,
      tx: Some(tx),
    };

    self.stats.refresh();
    debug!(requester = %key.requester, item = %key.item, "fetching from remote");
    let fetched = fetcher().await;

    let outcome = self.settle(key, fetched);
    if let Some(tx) = in_flight.tx.take() {
      // No receivers left is fine: nobody was waiting.
      let _ = tx.send(Some(outcome.clone()));
    }
    outcome
  }

  /// Apply a fetch result to the cache and clear the in-flight marker.
  fn settle(&self, key: &EntryKey, fetched: Result<Option<V>, RemoteError>) -> Outcome<V> {
    let mut state = self.state.lock();
    state.in_flight.remove(key);

    match fetched {
      Ok(Some(value)) => {
        self.store(&mut state, key, Some(value.clone()));
        Ok(CacheResult::from_network(Some(value)))
      }
      Ok(None) => {
        match self.not_found {
          NotFoundPolicy::Cache => self.store(&mut state, key, None),
          NotFoundPolicy::PassThrough => {
            state.entries.pop(key);
          }
        }
        debug!(requester = %key.requester, item = %key.item, "remote reported not found");
        Ok(CacheResult::from_network(None))
      }
      Err(err) => {
        self.stats.refresh_failed();
        match state.entries.peek(key) {
          Some(entry) => {
            warn!(
              requester = %key.requester,
              item = %key.item,
              error = %err,
              "refresh failed, serving stale value"
            );
            self.stats.stale_hit();
            Ok(CacheResult::offline(
              entry.value.clone(),
              Some(entry.cached_at),
            ))
          }
          None => {
            warn!(
              requester = %key.requester,
              item = %key.item,
              error = %err,
              "refresh failed with nothing cached"
            );
            Err(err)
          }
        }
      }
    }
  }

  fn store(&self, state: &mut State<V>, key: &EntryKey, value: Option<V>) {
    let entry = CacheEntry::new(value, self.ttl);
    if let Some((evicted, _)) = state.entries.push(key.clone(), entry) {
      // `push` also hands back the old value when the key was already present.
      if &evicted != key {
        self.stats.evicted();
        debug!(
          requester = %evicted.requester,
          item = %evicted.item,
          "evicted least recently used entry"
        );
      }
    }
  }
}

async fn wait_for_leader<V: Clone>(
  mut rx: watch::Receiver<OutcomeSlot<V>>,
) -> OutcomeSlot<V> {
  let outcome = rx.wait_for(Option::is_some).await.ok()?;
  outcome.clone()
}

fn unavailable(key: &EntryKey, source: RemoteError) -> ProviderError {
  ProviderError::RemoteUnavailable {
    requester: key.requester.clone(),
    item: key.item.clone(),
    source,
  }
}
