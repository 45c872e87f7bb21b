//! In-memory cache for the cached service provider
//!
//! Provides a single-slot store with a fixed freshness window. Entries past
//! the window are kept and still readable, allowing graceful degradation to
//! stale data when the upstream is unavailable.

mod store;

pub use store::{CacheEntry, CacheStore};
