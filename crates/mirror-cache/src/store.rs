//! # Cache Store
//!
//! The bounded key-value table. All mutations are synchronous and
//! complete before returning; the store is exclusively owned by one
//! coordinator and is not designed for pre-emptive concurrent mutation.

use crate::entry::CacheEntry;
use crate::key::{Category, CompositeKey};
use crate::snapshot::CacheSnapshot;
use crate::{DEFAULT_CAPACITY, DEFAULT_TTL_MS};
use mirror_types::{SystemTimeSource, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bounded key-value table with per-entry TTL and LRU eviction.
///
/// The value type is opaque to the store; the coordinator caches
/// `RecordPayload` values, tests cache whatever is convenient.
pub struct CacheStore<V> {
    /// Live entries by composite key.
    entries: HashMap<CompositeKey, CacheEntry<V>>,

    /// Soft capacity bound, enforced by eviction.
    capacity: usize,

    /// Default lifetime for entries written without an explicit TTL.
    default_ttl_ms: u64,

    /// Monotonic insertion counter; the eviction tie-break.
    next_seq: u64,

    /// Cumulative hit counter.
    hits: u64,

    /// Cumulative miss counter (absent or expired on read).
    misses: u64,

    /// Clock used for every expiry decision.
    time: Arc<dyn TimeSource>,
}

impl<V> CacheStore<V> {
    /// Create a store with the given capacity and default TTL, on the
    /// system clock.
    ///
    /// A zero capacity is clamped to one entry; configuration validation
    /// upstream rejects it before it gets here.
    #[must_use]
    pub fn new(capacity: usize, default_ttl_ms: u64) -> Self {
        Self::with_time_source(capacity, default_ttl_ms, Arc::new(SystemTimeSource::new()))
    }

    /// Create a store with defaults for capacity and TTL.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL_MS)
    }

    /// Create a store on an injected clock (tests use `ManualTimeSource`).
    #[must_use]
    pub fn with_time_source(
        capacity: usize,
        default_ttl_ms: u64,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            default_ttl_ms,
            next_seq: 0,
            hits: 0,
            misses: 0,
            time,
        }
    }

    /// Number of physically present entries (expired-but-unswept included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write or replace the entry for `category:id` with the default TTL.
    ///
    /// Never fails: if the table would exceed capacity, exactly one
    /// victim is evicted first.
    pub fn set(&mut self, category: Category, id: impl Into<String>, value: V) {
        let ttl_ms = self.default_ttl_ms;
        self.set_with_ttl(category, id, value, ttl_ms);
    }

    /// Write or replace the entry for `category:id` with an explicit TTL.
    pub fn set_with_ttl(&mut self, category: Category, id: impl Into<String>, value: V, ttl_ms: u64) {
        let key = CompositeKey::new(category, id);
        let now = self.time.now();

        // Replacing an existing key never grows the table.
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(key, CacheEntry::new(value, now, ttl_ms, seq));
    }

    /// Remove the entry for `category:id`. Idempotent.
    pub fn remove(&mut self, category: Category, id: &str) -> Option<V> {
        let key = CompositeKey::new(category, id);
        self.entries.remove(&key).map(|entry| entry.value)
    }

    /// Remove every entry in one category. Returns the number removed.
    pub fn clear_category(&mut self, category: Category) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.category != category);
        before - self.entries.len()
    }

    /// Remove every entry.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Remove every physically present expired entry. Returns the number
    /// swept. Driven periodically by the runtime's cleanup task.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.time.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let swept = before - self.entries.len();
        if swept > 0 {
            debug!(swept, "Expired entries purged");
        }
        swept
    }

    /// Evict the LRU victim: smallest `last_accessed_at`, ties broken by
    /// oldest insertion sequence.
    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_accessed_at, entry.seq))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            debug!(key = %key, "Capacity reached, evicting LRU entry");
            self.entries.remove(&key);
        }
    }
}

impl<V: Clone> CacheStore<V> {
    /// Look up `category:id`.
    ///
    /// An expired entry is removed and reported as a miss. A hit bumps
    /// the entry's access count and refreshes its last-access time.
    pub fn get(&mut self, category: Category, id: &str) -> Option<V> {
        let key = CompositeKey::new(category, id);
        let now = self.time.now();

        let Some(entry) = self.entries.get_mut(&key) else {
            self.misses += 1;
            return None;
        };

        if entry.is_expired(now) {
            debug!(key = %key, "Entry expired on read");
            self.entries.remove(&key);
            self.misses += 1;
            return None;
        }

        entry.touch(now);
        self.hits += 1;
        Some(entry.value.clone())
    }

    /// All live values in one category, lazily sweeping any expired
    /// entries found along the way. Returned in insertion order.
    pub fn all_in_category(&mut self, category: Category) -> Vec<V> {
        let now = self.time.now();
        self.entries
            .retain(|key, entry| key.category != category || !entry.is_expired(now));

        let mut live: Vec<(u64, &CacheEntry<V>)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.category == category)
            .map(|(_, entry)| (entry.seq, entry))
            .collect();
        live.sort_unstable_by_key(|(seq, _)| *seq);

        live.into_iter()
            .map(|(_, entry)| entry.value.clone())
            .collect()
    }

    /// Export an ordered `(key, entry)` snapshot, oldest insertion first.
    ///
    /// Expired entries are skipped; they are logically absent.
    #[must_use]
    pub fn export_snapshot(&self) -> CacheSnapshot<V> {
        let now = self.time.now();
        let mut pairs: Vec<(&CompositeKey, &CacheEntry<V>)> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .collect();
        pairs.sort_unstable_by_key(|(_, entry)| entry.seq);

        CacheSnapshot {
            entries: pairs
                .into_iter()
                .map(|(key, entry)| (key.to_string(), entry.clone()))
                .collect(),
        }
    }

    /// Restore entries from a snapshot.
    ///
    /// Entries already expired at load time are dropped; malformed keys
    /// are skipped with a warning; capacity is enforced through the
    /// normal eviction path. Returns the number restored.
    pub fn restore_snapshot(&mut self, snapshot: CacheSnapshot<V>) -> usize {
        let now = self.time.now();
        let mut restored = 0;

        for (raw_key, mut entry) in snapshot.entries {
            let Some(key) = CompositeKey::parse(&raw_key) else {
                warn!(key = %raw_key, "Skipping snapshot entry with malformed key");
                continue;
            };
            if entry.is_expired(now) {
                continue;
            }

            if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
                self.evict_one();
            }
            entry.seq = self.next_seq;
            self.next_seq += 1;
            self.entries.insert(key, entry);
            restored += 1;
        }

        restored
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut per_category = HashMap::new();
        for category in Category::ALL {
            let count = self
                .entries
                .keys()
                .filter(|key| key.category == category)
                .count();
            per_category.insert(category, count);
        }

        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            per_category,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug)]
pub struct CacheStats {
    /// Physically present entries.
    pub entries: usize,
    /// Configured capacity.
    pub capacity: usize,
    /// Cumulative hits.
    pub hits: u64,
    /// Cumulative misses.
    pub misses: u64,
    /// Entry counts per category.
    pub per_category: HashMap<Category, usize>,
}

impl CacheStats {
    /// Cumulative hit rate in `[0, 1]`; zero before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}
