//! # Cache Lifecycle Tests
//!
//! Exercises the store's three removal paths end to end on a manual
//! clock: explicit delete, lazy TTL expiry, and LRU eviction under
//! capacity pressure.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mirror_cache::{CacheStore, Category, JsonFileSnapshotStore, SnapshotStore};
    use mirror_types::ManualTimeSource;

    fn store_at(capacity: usize, ttl_ms: u64, clock: &ManualTimeSource) -> CacheStore<String> {
        CacheStore::with_time_source(capacity, ttl_ms, Arc::new(clock.clone()))
    }

    // =========================================================================
    // EVICTION (Scenario A shape)
    // =========================================================================

    #[test]
    fn test_lru_eviction_spares_refreshed_entry() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(2, 60_000, &clock);

        store.set(Category::Agent, "a", "va".to_string());
        clock.advance(10);
        store.set(Category::Agent, "b", "vb".to_string());

        // Refresh `a` so `b` becomes the least recently used.
        clock.advance(10);
        assert!(store.get(Category::Agent, "a").is_some());

        clock.advance(10);
        store.set(Category::Agent, "c", "vc".to_string());

        assert_eq!(store.len(), 2);
        assert!(store.get(Category::Agent, "a").is_some());
        assert!(store.get(Category::Agent, "b").is_none(), "b was the LRU victim");
        assert!(store.get(Category::Agent, "c").is_some());
    }

    #[test]
    fn test_eviction_removes_exactly_one_per_overflow() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(3, 60_000, &clock);

        for i in 0..10 {
            clock.advance(1);
            store.set(Category::Order, format!("o{i}"), format!("v{i}"));
            assert!(store.len() <= 3);
        }
        assert_eq!(store.len(), 3);

        // The three most recent writes survive.
        for i in 7..10 {
            assert!(store.get(Category::Order, &format!("o{i}")).is_some());
        }
    }

    #[test]
    fn test_eviction_crosses_category_boundaries() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(2, 60_000, &clock);

        store.set(Category::Agent, "a", "va".to_string());
        clock.advance(10);
        store.set(Category::Listing, "l", "vl".to_string());
        clock.advance(10);
        store.set(Category::Order, "o", "vo".to_string());

        // The victim is the globally least recently used entry, not one
        // scoped to the incoming write's category.
        assert!(store.get(Category::Agent, "a").is_none());
        assert!(store.get(Category::Listing, "l").is_some());
        assert!(store.get(Category::Order, "o").is_some());
    }

    // =========================================================================
    // TTL (Scenario B shape)
    // =========================================================================

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(10, 1_000, &clock);

        store.set(Category::Agent, "k", "v".to_string());

        clock.advance(500);
        assert_eq!(store.get(Category::Agent, "k"), Some("v".to_string()));

        clock.advance(1_000);
        assert!(store.get(Category::Agent, "k").is_none());
        assert_eq!(store.len(), 0, "expired entry is removed on read");
    }

    #[test]
    fn test_entry_still_live_at_exact_ttl() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(10, 1_000, &clock);

        store.set(Category::Agent, "k", "v".to_string());
        clock.advance(1_000);
        assert!(store.get(Category::Agent, "k").is_some());
    }

    #[test]
    fn test_category_scan_sweeps_expired_entries() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(10, 1_000, &clock);

        store.set(Category::Message, "m1", "old".to_string());
        clock.advance(800);
        store.set(Category::Message, "m2", "new".to_string());
        clock.advance(400);

        // m1 is past its TTL, m2 is not.
        let live = store.all_in_category(Category::Message);
        assert_eq!(live, vec!["new".to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge_removes_only_expired() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(10, 1_000, &clock);

        store.set(Category::Agent, "old", "v".to_string());
        clock.advance(600);
        store.set(Category::Agent, "new", "v".to_string());
        clock.advance(600);

        assert_eq!(store.purge_expired(), 1);
        assert!(store.get(Category::Agent, "new").is_some());
    }

    #[test]
    fn test_per_entry_ttl_overrides_default() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(10, 60_000, &clock);

        store.set_with_ttl(Category::Agent, "short", "v".to_string(), 100);
        store.set(Category::Agent, "long", "v".to_string());

        clock.advance(200);
        assert!(store.get(Category::Agent, "short").is_none());
        assert!(store.get(Category::Agent, "long").is_some());
    }

    // =========================================================================
    // STATS
    // =========================================================================

    #[test]
    fn test_stats_track_mixed_workload() {
        let clock = ManualTimeSource::new(0);
        let mut store = store_at(10, 1_000, &clock);

        store.set(Category::Agent, "a", "v".to_string());
        store.set(Category::Order, "o", "v".to_string());

        assert!(store.get(Category::Agent, "a").is_some()); // hit
        assert!(store.get(Category::Agent, "missing").is_none()); // miss
        clock.advance(2_000);
        assert!(store.get(Category::Order, "o").is_none()); // expiry counts as miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.per_category[&Category::Agent], 1);
    }

    // =========================================================================
    // SNAPSHOT ROUND TRIP
    // =========================================================================

    #[tokio::test]
    async fn test_file_snapshot_round_trip_preserves_live_entries() {
        let clock = ManualTimeSource::new(0);
        let dir = tempfile::tempdir().unwrap();
        let snapshot_store = JsonFileSnapshotStore::new(dir.path(), "mirror-test");

        let mut store = store_at(10, 10_000, &clock);
        store.set(Category::Agent, "a1", "alpha".to_string());
        store.set_with_ttl(Category::Agent, "a2", "doomed".to_string(), 100);
        clock.advance(500);

        snapshot_store.save(&store.export_snapshot()).await.unwrap();

        let mut restored = store_at(10, 10_000, &clock);
        let snapshot = snapshot_store.load().await.unwrap().unwrap();
        assert_eq!(restored.restore_snapshot(snapshot), 1, "expired entry dropped");
        assert_eq!(restored.get(Category::Agent, "a1"), Some("alpha".to_string()));
        assert!(restored.get(Category::Agent, "a2").is_none());
    }

    #[tokio::test]
    async fn test_restore_respects_capacity() {
        let clock = ManualTimeSource::new(0);
        let mut big = store_at(10, 10_000, &clock);
        for i in 0..6 {
            clock.advance(1);
            big.set(Category::Agent, format!("a{i}"), format!("v{i}"));
        }

        let mut small = store_at(3, 10_000, &clock);
        small.restore_snapshot(big.export_snapshot());
        assert_eq!(small.len(), 3);
    }
}
