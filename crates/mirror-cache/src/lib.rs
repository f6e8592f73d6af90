//! # Mirror Cache - Bounded TTL + LRU Store
//!
//! Key-value table for mirrored domain records with three removal paths:
//!
//! - **Explicit delete** by composite key
//! - **Lazy TTL expiry** detected on read or during category scans
//! - **LRU eviction** when a write would exceed the configured capacity
//!
//! ## Invariants
//!
//! - At most one entry per composite key (`category:id`).
//! - An entry is logically absent once `now - stored_at > ttl`, whether
//!   or not it has physically been swept yet.
//! - Capacity is a soft bound enforced by eviction; a write is never
//!   rejected.
//! - Each overflowing write evicts exactly one entry: the one with the
//!   smallest `last_accessed_at`, ties broken by oldest insertion.
//!
//! Misses and expiries are normal outcomes, not errors.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod entry;
pub mod key;
pub mod snapshot;
pub mod store;

// Re-export main types
pub use entry::CacheEntry;
pub use key::{Category, CompositeKey};
pub use snapshot::{
    CacheSnapshot, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore,
};
pub use store::{CacheStats, CacheStore};

/// Default maximum number of live entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default entry lifetime in milliseconds (5 minutes).
pub const DEFAULT_TTL_MS: u64 = 300_000;
