//! # Event Bus
//!
//! Registry of typed subscriptions with synchronous, in-order dispatch.

use crate::subscription::{EventFilter, Listener, Subscription, SubscriptionId, SubscriptionInfo};
use crate::DEFAULT_MAX_LISTENERS;
use mirror_types::{EventKind, MirrorEvent, SystemTimeSource, TimeSource};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, error, warn};

/// In-process publish/subscribe registry.
///
/// Listeners run synchronously inside `emit()`, in registration order.
/// The bus is internally synchronized so collaborators can share it
/// behind an `Arc`, but dispatch itself never holds the registry lock
/// while a listener runs, so listeners may subscribe or unsubscribe
/// re-entrantly.
pub struct EventBus {
    /// Registered subscriptions, in registration order.
    subscriptions: RwLock<Vec<Subscription>>,

    /// Monotonic id allocator.
    next_id: AtomicU64,

    /// Total events emitted.
    events_emitted: AtomicU64,

    /// Soft cap on active listeners per event kind.
    max_listeners: usize,

    /// Clock for subscription bookkeeping.
    time: Arc<dyn TimeSource>,
}

impl EventBus {
    /// Create a bus with the default per-kind listener cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_listeners(DEFAULT_MAX_LISTENERS)
    }

    /// Create a bus with a custom per-kind listener cap.
    #[must_use]
    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events_emitted: AtomicU64::new(0),
            max_listeners: max_listeners.max(1),
            time: Arc::new(SystemTimeSource::new()),
        }
    }

    /// Register a listener for one event kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        listener: impl Fn(&MirrorEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.register(kind, Arc::new(listener), None)
    }

    /// Register a listener with a payload filter.
    ///
    /// The listener fires only for events where `filter` returns true.
    pub fn subscribe_filtered(
        &self,
        kind: EventKind,
        listener: impl Fn(&MirrorEvent) + Send + Sync + 'static,
        filter: impl Fn(&MirrorEvent) -> bool + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.register(kind, Arc::new(listener), Some(Arc::new(filter)))
    }

    fn register(
        &self,
        kind: EventKind,
        listener: Listener,
        filter: Option<EventFilter>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscription = Subscription {
            id,
            kind,
            listener,
            filter,
            active: true,
            created_at: self.time.now(),
        };

        let mut subs = self.subscriptions.write().expect("subscription table poisoned");
        subs.push(subscription);

        let kind_count = subs.iter().filter(|s| s.active && s.kind == kind).count();
        if kind_count > self.max_listeners {
            // Soft cap: diagnostic only, the subscription stays registered.
            warn!(
                kind = %kind,
                listeners = kind_count,
                cap = self.max_listeners,
                "Listener count exceeds the configured cap"
            );
        }
        drop(subs);

        debug!(id = %id, kind = %kind, "Subscription registered");
        id
    }

    /// Deactivate and remove a subscription.
    ///
    /// Returns true when the subscription existed. Calling twice is safe
    /// and has no additional effect.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.write().expect("subscription table poisoned");
        let Some(index) = subs.iter().position(|s| s.id == id) else {
            return false;
        };
        // active -> removed is the only transition, and it is terminal.
        subs[index].active = false;
        subs.remove(index);
        debug!(id = %id, "Subscription removed");
        true
    }

    /// Deliver `event` to every active subscription of its kind, in
    /// registration order. Returns the number of listeners that ran.
    ///
    /// A panicking listener is caught and logged; delivery continues to
    /// the remaining listeners for the same event.
    pub fn emit(&self, event: &MirrorEvent) -> usize {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        let kind = event.kind();

        // Snapshot this kind's subscriptions, then dispatch without the
        // lock. Filters run in the dispatch loop, not here: they are
        // arbitrary user code and may touch the bus re-entrantly or
        // panic, just like listeners.
        let matched: Vec<(SubscriptionId, Listener, Option<EventFilter>)> = {
            let subs = self.subscriptions.read().expect("subscription table poisoned");
            subs.iter()
                .filter(|s| s.wants_kind(kind))
                .map(|s| (s.id, Arc::clone(&s.listener), s.filter.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (id, listener, filter) in matched {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                let passes = match &filter {
                    Some(filter) => filter(event),
                    None => true,
                };
                if passes {
                    listener(event);
                }
                passes
            }));
            match outcome {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(panic) => {
                    let reason = panic_message(&panic);
                    error!(
                        subscription = %id,
                        kind = %kind,
                        reason,
                        "Listener panicked; continuing delivery"
                    );
                }
            }
        }

        debug!(kind = %kind, delivered, "Event emitted");
        delivered
    }

    /// Introspection view of all active subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let subs = self.subscriptions.read().expect("subscription table poisoned");
        subs.iter()
            .filter(|s| s.active)
            .map(|s| SubscriptionInfo {
                id: s.id,
                kind: s.kind,
                filtered: s.filter.is_some(),
                created_at: s.created_at,
            })
            .collect()
    }

    /// Active subscription counts per event kind.
    #[must_use]
    pub fn counts_by_kind(&self) -> HashMap<EventKind, usize> {
        let subs = self.subscriptions.read().expect("subscription table poisoned");
        let mut counts = HashMap::new();
        for sub in subs.iter().filter(|s| s.active) {
            *counts.entry(sub.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Deactivate and drop every subscription. Used at teardown.
    ///
    /// Returns the number removed.
    pub fn clear_subscriptions(&self) -> usize {
        let mut subs = self.subscriptions.write().expect("subscription table poisoned");
        for sub in subs.iter_mut() {
            sub.active = false;
        }
        let removed = subs.len();
        subs.clear();
        if removed > 0 {
            debug!(removed, "All subscriptions cleared");
        }
        removed
    }

    /// Total events emitted since construction.
    #[must_use]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    /// Pull-style subscription: a stream of events of one kind.
    ///
    /// Backed by an unbounded channel fed from a normal subscription;
    /// dropping the stream unsubscribes.
    #[must_use]
    pub fn stream(self: &Arc<Self>, kind: EventKind) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(kind, move |event| {
            // Receiver dropped: deliveries become no-ops until the
            // stream's Drop unsubscribes.
            let _ = tx.send(event.clone());
        });

        EventStream {
            bus: Arc::clone(self),
            id,
            receiver: rx,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// A stream wrapper over a bus subscription.
///
/// Implements `tokio_stream::Stream`; dropping it removes the backing
/// subscription.
pub struct EventStream {
    bus: Arc<EventBus>,
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<MirrorEvent>,
}

impl EventStream {
    /// The backing subscription id.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Stream for EventStream {
    type Item = MirrorEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}
