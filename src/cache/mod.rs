//! In-memory caching layer between callers and a slow remote lookup.
//!
//! Two policies share one freshness model and stale-on-error behaviour:
//! - [`KeyedCache`] caches per-(requester, item) lookups with LRU eviction
//!   and at most one in-flight fetch per key
//! - [`SnapshotCache`] caches a whole collection as one unit behind a single
//!   refresh gate

mod keyed;
mod result;
mod snapshot;
mod stats;

pub use keyed::{KeyedCache, NotFoundPolicy};
pub use result::{CacheResult, CacheSource, EntryState, MAX_TTL};
pub use snapshot::SnapshotCache;
pub use stats::CacheStats;
