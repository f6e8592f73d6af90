//! # Agent-Mirror Benchmarks
//!
//! Performance checks for the hot paths:
//!
//! | Area | Claim | Target |
//! |------|-------|--------|
//! | Cache | O(1) get/set by composite key | < 1µs |
//! | Cache | Eviction under sustained overflow | < 5µs per write |
//! | Bus | Synchronous fan-out to 100 listeners | < 50µs per emit |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mirror_bus::EventBus;
use mirror_cache::{CacheStore, Category};
use mirror_types::{ActorAddress, AgentRecord, AgentStatus, EventKind, MirrorEvent, Timestamp};
use rand::Rng;

fn agent(id: &str) -> AgentRecord {
    AgentRecord {
        id: id.to_string(),
        owner: ActorAddress::new("agent1qowner"),
        name: "bench".to_string(),
        capabilities: vec!["chat".to_string()],
        status: AgentStatus::Active,
        created_at: Timestamp::from_millis(0),
        updated_at: Timestamp::from_millis(0),
    }
}

// ============================================================================
// Cache Benchmarks
// ============================================================================

fn bench_cache_get_hit(c: &mut Criterion) {
    let mut store: CacheStore<AgentRecord> = CacheStore::new(10_000, 600_000);
    for i in 0..10_000 {
        store.set(Category::Agent, format!("a{i}"), agent(&format!("a{i}")));
    }

    let mut rng = rand::thread_rng();
    c.bench_function("cache_get_hit", |b| {
        b.iter(|| {
            let id = format!("a{}", rng.gen_range(0..10_000));
            black_box(store.get(Category::Agent, &id))
        })
    });
}

fn bench_cache_set_with_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_set");
    for capacity in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                let mut store: CacheStore<AgentRecord> = CacheStore::new(capacity, 600_000);
                let mut i: u64 = 0;
                b.iter(|| {
                    // Past `capacity` writes, every set evicts.
                    store.set(Category::Agent, format!("a{i}"), agent("a"));
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Bus Benchmarks
// ============================================================================

fn bench_bus_emit_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus_emit");
    for listeners in [1usize, 10, 100] {
        let bus = EventBus::with_max_listeners(listeners.max(100));
        for _ in 0..listeners {
            bus.subscribe(EventKind::AgentRegistered, |event| {
                black_box(event.kind());
            });
        }

        let event = MirrorEvent::AgentRegistered(agent("a1"));
        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, _| b.iter(|| black_box(bus.emit(&event))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_cache_get_hit,
    bench_cache_set_with_eviction,
    bench_bus_emit_fanout
);
criterion_main!(benches);
