//! Cache entries.

use mirror_types::Timestamp;
use serde::{Deserialize, Serialize};

/// A single cache entry.
///
/// Entries are created whole on every write and never partially mutated,
/// except for the access bookkeeping a hit performs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,
    /// When the entry was written.
    pub stored_at: Timestamp,
    /// Lifetime in milliseconds, counted from `stored_at`.
    pub ttl_ms: u64,
    /// Number of hits served from this entry.
    pub access_count: u64,
    /// When the entry was last read (or written, for a fresh entry).
    pub last_accessed_at: Timestamp,
    /// Insertion sequence, used as the stable eviction tie-break.
    /// Re-stamped on snapshot restore; not part of the wire format.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    /// Create a fresh entry written at `now`.
    #[must_use]
    pub(crate) fn new(value: V, now: Timestamp, ttl_ms: u64, seq: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl_ms,
            access_count: 0,
            last_accessed_at: now,
            seq,
        }
    }

    /// Whether the entry is logically absent at `now`.
    ///
    /// Strict inequality: an entry with `ttl_ms = T` is still valid when
    /// read exactly `T` milliseconds after it was stored.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.millis_since(self.stored_at) > self.ttl_ms
    }

    /// Record a hit at `now`.
    pub(crate) fn touch(&mut self, now: Timestamp) {
        self.access_count += 1;
        self.last_accessed_at = now;
    }
}
