//! Single-slot cache store with a fixed TTL
//!
//! Holds at most one cached payload together with the timestamp of the fetch
//! that produced it. The slot is only ever overwritten by a newer successful
//! fetch; it is never cleared, so a stale entry remains available as a
//! fallback long after its freshness window has passed.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

/// A cached payload and the time it was fetched
///
/// `payload` and `fetched_at` always travel together; an empty slot is
/// represented by the absence of the whole entry, never by a half-filled one.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The last successfully fetched payload
    pub payload: Value,
    /// When that fetch succeeded
    pub fetched_at: DateTime<Utc>,
}

/// In-memory single-slot cache with a fixed validity window
///
/// All access goes through a mutex; individual operations are atomic and
/// never held across an await point.
#[derive(Debug)]
pub struct CacheStore {
    /// Freshness window; constant for the lifetime of the store
    ttl: Duration,
    /// The single slot: empty until the first successful fetch
    slot: Mutex<Option<CacheEntry>>,
}

impl CacheStore {
    /// Creates an empty store with the given freshness window
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The store's freshness window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        // A poisoned lock only means a panic elsewhere mid-access; the slot
        // itself is always a coherent Option, so recover the guard.
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True iff an entry exists and is still within the freshness window
    pub fn is_fresh(&self) -> bool {
        match self.slot().as_ref() {
            Some(entry) => Utc::now() - entry.fetched_at < self.ttl,
            None => false,
        }
    }

    /// Returns the current entry regardless of freshness
    ///
    /// Used for the stale-fallback path; callers check [`is_fresh`] when only
    /// a fresh entry will do.
    ///
    /// [`is_fresh`]: CacheStore::is_fresh
    pub fn get(&self) -> Option<CacheEntry> {
        self.slot().clone()
    }

    /// Replaces the slot with a freshly fetched payload
    pub fn put(&self, payload: Value, now: DateTime<Utc>) {
        *self.slot() = Some(CacheEntry {
            payload,
            fetched_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ten_minutes() -> CacheStore {
        CacheStore::new(Duration::minutes(10))
    }

    #[test]
    fn test_empty_store_is_not_fresh() {
        let store = ten_minutes();
        assert!(!store.is_fresh());
        assert!(store.get().is_none());
    }

    #[test]
    fn test_put_makes_store_fresh() {
        let store = ten_minutes();
        let now = Utc::now();

        store.put(json!({ "temp": 21 }), now);

        assert!(store.is_fresh());
        let entry = store.get().expect("entry should exist after put");
        assert_eq!(entry.payload["temp"], 21);
        assert_eq!(entry.fetched_at, now);
    }

    #[test]
    fn test_entry_past_ttl_is_stale_but_still_readable() {
        let store = ten_minutes();
        let fetched_at = Utc::now() - Duration::minutes(11);

        store.put(json!({ "temp": 18 }), fetched_at);

        assert!(!store.is_fresh(), "entry older than TTL must not be fresh");
        let entry = store.get().expect("stale entry should remain readable");
        assert_eq!(entry.payload["temp"], 18);
        assert_eq!(entry.fetched_at, fetched_at);
    }

    #[test]
    fn test_entry_just_inside_ttl_is_fresh() {
        let store = ten_minutes();
        store.put(json!({}), Utc::now() - Duration::minutes(9));
        assert!(store.is_fresh());
    }

    #[test]
    fn test_put_overwrites_previous_entry() {
        let store = ten_minutes();
        let earlier = Utc::now() - Duration::minutes(5);
        let later = Utc::now();

        store.put(json!({ "version": 1 }), earlier);
        store.put(json!({ "version": 2 }), later);

        let entry = store.get().expect("entry should exist");
        assert_eq!(entry.payload["version"], 2);
        assert_eq!(entry.fetched_at, later);
    }

    #[test]
    fn test_ttl_is_constant() {
        let store = CacheStore::new(Duration::minutes(10));
        assert_eq!(store.ttl(), Duration::minutes(10));
    }
}
