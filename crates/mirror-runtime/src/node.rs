//! # Mirror Node (Coordinator)
//!
//! Binds each upstream domain event to a cache update and a typed bus
//! emission, in that fixed order. Owns the entry table and the
//! subscription table for its whole lifecycle; collaborators receive
//! handles, never globals.

use crate::config::{ConfigError, MirrorConfig};
use mirror_bus::EventBus;
use mirror_cache::{
    CacheStats, CacheStore, Category, JsonFileSnapshotStore, SnapshotStore,
};
use mirror_link::{ConnectionManager, LinkState, UpstreamTransport};
use mirror_types::{
    AgentRecord, ChannelRecord, MessageRecord, MirrorEvent, RecordPayload, ServiceListing,
    SystemTimeSource, TimeSource, WorkOrder,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The coordinator: one per process, explicitly constructed and torn
/// down.
pub struct MirrorNode {
    config: MirrorConfig,
    cache: Arc<Mutex<CacheStore<RecordPayload>>>,
    bus: Arc<EventBus>,
    link: Arc<ConnectionManager>,
    snapshot: Option<Arc<dyn SnapshotStore<RecordPayload>>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MirrorNode {
    /// Create a node on the system clock.
    ///
    /// When persistence is enabled the snapshot lands in
    /// `./<persistence_key>.json`; use [`MirrorNode::with_snapshot_store`]
    /// to direct it elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed configuration. This is the
    /// only synchronous failure in the node's lifecycle.
    pub fn new(
        config: MirrorConfig,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Result<Self, ConfigError> {
        let snapshot: Option<Arc<dyn SnapshotStore<RecordPayload>>> = if config.enable_persistence
        {
            Some(Arc::new(JsonFileSnapshotStore::new(
                ".",
                &config.persistence_key,
            )))
        } else {
            None
        };
        Self::with_time_source(config, transport, snapshot, Arc::new(SystemTimeSource::new()))
    }

    /// Create a node with an explicit snapshot adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed configuration.
    pub fn with_snapshot_store(
        config: MirrorConfig,
        transport: Arc<dyn UpstreamTransport>,
        snapshot: Arc<dyn SnapshotStore<RecordPayload>>,
    ) -> Result<Self, ConfigError> {
        Self::with_time_source(
            config,
            transport,
            Some(snapshot),
            Arc::new(SystemTimeSource::new()),
        )
    }

    /// Fully injected constructor; tests drive a `ManualTimeSource`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed configuration.
    pub fn with_time_source(
        config: MirrorConfig,
        transport: Arc<dyn UpstreamTransport>,
        snapshot: Option<Arc<dyn SnapshotStore<RecordPayload>>>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let cache = Arc::new(Mutex::new(CacheStore::with_time_source(
            config.capacity,
            config.ttl_ms,
            Arc::clone(&time),
        )));
        let bus = Arc::new(EventBus::with_max_listeners(config.max_listeners));
        let link = Arc::new(ConnectionManager::with_time_source(
            transport,
            Arc::clone(&bus),
            config.link_config(),
            time,
        ));

        let snapshot = if config.enable_persistence {
            snapshot
        } else {
            None
        };

        Ok(Self {
            config,
            cache,
            bus,
            link,
            snapshot,
            sweeper: Mutex::new(None),
        })
    }

    /// The event bus handle consumers subscribe on.
    #[must_use]
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Current upstream link state.
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Current cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    /// Initialize the node: restore the snapshot (best effort), start
    /// the background expiry sweep, and bring the upstream link up.
    pub async fn init(self: &Arc<Self>) {
        if let Some(store) = &self.snapshot {
            match store.load().await {
                Ok(Some(snapshot)) => {
                    let restored = self.lock_cache().restore_snapshot(snapshot);
                    info!(restored, "Cache restored from snapshot");
                }
                Ok(None) => debug!("No snapshot to restore"),
                Err(e) => {
                    warn!(error = %e, "Snapshot load failed, starting with an empty cache");
                }
            }
        }

        self.spawn_sweeper();
        self.link.start().await;
    }

    /// Process one upstream domain event.
    ///
    /// The cache write completes strictly before the emission, so any
    /// listener running synchronously inside the emission observes the
    /// post-update value. Events without a mirrored record family
    /// (payments, escrow, reputation, system) are emit-only.
    pub fn handle_upstream_event(&self, event: MirrorEvent) {
        if let Some((category, id, payload)) = mirrored_record(&event) {
            self.lock_cache().set(category, id, payload);
        }
        self.bus.emit(&event);
    }

    /// Drive the node from the transport's raw-event feed.
    ///
    /// Events are processed strictly in arrival order; the task ends
    /// when the sender side is dropped.
    pub fn run_upstream(
        self: &Arc<Self>,
        mut events: mpsc::UnboundedReceiver<MirrorEvent>,
    ) -> JoinHandle<()> {
        let node = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                node.handle_upstream_event(event);
            }
            debug!("Upstream event feed closed");
        })
    }

    /// Tear the node down: drop every subscription, stop the link
    /// (cancelling any pending reconnect), save a snapshot (best
    /// effort), and cancel the expiry sweep. Idempotent.
    pub async fn teardown(&self) {
        let removed = self.bus.clear_subscriptions();
        self.link.stop();

        if let Some(store) = &self.snapshot {
            let snapshot = self.lock_cache().export_snapshot();
            match store.save(&snapshot).await {
                Ok(()) => info!(entries = snapshot.entries.len(), "Snapshot saved"),
                Err(e) => warn!(error = %e, "Best-effort snapshot save failed"),
            }
        }

        let sweeper = self.sweeper.lock().expect("sweeper handle poisoned").take();
        if let Some(handle) = sweeper {
            handle.abort();
        }
        info!(subscriptions_removed = removed, "Mirror node torn down");
    }

    // =========================================================================
    // Typed cache reads
    // =========================================================================

    /// Look up a mirrored agent record.
    #[must_use]
    pub fn agent(&self, id: &str) -> Option<AgentRecord> {
        match self.lock_cache().get(Category::Agent, id)? {
            RecordPayload::Agent(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a mirrored channel record.
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<ChannelRecord> {
        match self.lock_cache().get(Category::Channel, id)? {
            RecordPayload::Channel(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a mirrored message record.
    #[must_use]
    pub fn message(&self, id: &str) -> Option<MessageRecord> {
        match self.lock_cache().get(Category::Message, id)? {
            RecordPayload::Message(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a mirrored service listing.
    #[must_use]
    pub fn listing(&self, id: &str) -> Option<ServiceListing> {
        match self.lock_cache().get(Category::Listing, id)? {
            RecordPayload::Listing(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a mirrored work order.
    #[must_use]
    pub fn order(&self, id: &str) -> Option<WorkOrder> {
        match self.lock_cache().get(Category::Order, id)? {
            RecordPayload::Order(record) => Some(record),
            _ => None,
        }
    }

    /// All live mirrored agents, oldest write first.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentRecord> {
        self.lock_cache()
            .all_in_category(Category::Agent)
            .into_iter()
            .filter_map(|payload| match payload {
                RecordPayload::Agent(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// All live mirrored work orders, oldest write first.
    #[must_use]
    pub fn orders(&self) -> Vec<WorkOrder> {
        self.lock_cache()
            .all_in_category(Category::Order)
            .into_iter()
            .filter_map(|payload| match payload {
                RecordPayload::Order(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Drop every mirrored record in one category.
    pub fn clear_category(&self, category: Category) -> usize {
        self.lock_cache().clear_category(category)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, CacheStore<RecordPayload>> {
        self.cache.lock().expect("cache table poisoned")
    }

    /// Background sweep of expired entries, on the configured period.
    fn spawn_sweeper(self: &Arc<Self>) {
        let cache = Arc::clone(&self.cache);
        let period = self.config.cleanup_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // Skip the immediate first tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let swept = cache.lock().expect("cache table poisoned").purge_expired();
                if swept > 0 {
                    debug!(swept, "Background sweep removed expired entries");
                }
            }
        });
        let mut slot = self.sweeper.lock().expect("sweeper handle poisoned");
        // A repeated init() must not leak the previous sweep task.
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(handle);
    }
}

/// The single switch mapping an event to its mirrored record family.
///
/// Returns `None` for emit-only events.
fn mirrored_record(event: &MirrorEvent) -> Option<(Category, String, RecordPayload)> {
    match event {
        MirrorEvent::AgentRegistered(r)
        | MirrorEvent::AgentUpdated(r)
        | MirrorEvent::AgentDeactivated(r) => Some((
            Category::Agent,
            r.id.clone(),
            RecordPayload::Agent(r.clone()),
        )),

        MirrorEvent::ServiceListed(l)
        | MirrorEvent::ServiceUpdated(l)
        | MirrorEvent::ServiceDelisted(l) => Some((
            Category::Listing,
            l.id.clone(),
            RecordPayload::Listing(l.clone()),
        )),

        MirrorEvent::OrderCreated(o)
        | MirrorEvent::OrderUpdated(o)
        | MirrorEvent::OrderCompleted(o)
        | MirrorEvent::OrderCancelled(o) => Some((
            Category::Order,
            o.id.clone(),
            RecordPayload::Order(o.clone()),
        )),

        MirrorEvent::MessageSent(m) | MirrorEvent::MessageReceived(m) => Some((
            Category::Message,
            m.id.clone(),
            RecordPayload::Message(m.clone()),
        )),

        MirrorEvent::ChannelCreated(c)
        | MirrorEvent::ChannelUpdated(c)
        | MirrorEvent::ChannelJoined(c)
        | MirrorEvent::ChannelLeft(c) => Some((
            Category::Channel,
            c.id.clone(),
            RecordPayload::Channel(c.clone()),
        )),

        MirrorEvent::PaymentProcessed(_)
        | MirrorEvent::PaymentReleased(_)
        | MirrorEvent::EscrowCreated(_)
        | MirrorEvent::EscrowDisputed(_)
        | MirrorEvent::ReputationUpdated(_)
        | MirrorEvent::SystemError(_)
        | MirrorEvent::ConnectionEstablished
        | MirrorEvent::ConnectionLost
        | MirrorEvent::ConnectionReconnected => None,
    }
}
