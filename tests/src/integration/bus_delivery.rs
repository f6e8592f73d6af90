//! # Bus Delivery Tests
//!
//! Verifies the synchronous delivery contract across realistic
//! multi-listener setups: registration-order dispatch, payload filters,
//! panic isolation, and one-way subscription deactivation.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use mirror_bus::EventBus;
    use mirror_types::{EventKind, MirrorEvent};

    use crate::integration::fixtures;

    // =========================================================================
    // FILTERED EMISSION (Scenario C shape)
    // =========================================================================

    #[test]
    fn test_filter_gates_high_value_listener() {
        let bus = EventBus::new();

        let plain_fires = Arc::new(AtomicUsize::new(0));
        let filtered_fires = Arc::new(AtomicUsize::new(0));

        let plain = Arc::clone(&plain_fires);
        bus.subscribe(EventKind::OrderCreated, move |_| {
            plain.fetch_add(1, Ordering::SeqCst);
        });

        let filtered = Arc::clone(&filtered_fires);
        bus.subscribe_filtered(
            EventKind::OrderCreated,
            move |_| {
                filtered.fetch_add(1, Ordering::SeqCst);
            },
            |event| match event {
                MirrorEvent::OrderCreated(order) => order.amount > 100,
                _ => false,
            },
        );

        let delivered = bus.emit(&MirrorEvent::OrderCreated(fixtures::order("o1", 50)));
        assert_eq!(delivered, 1, "only the unfiltered listener fires for amount 50");
        assert_eq!(plain_fires.load(Ordering::SeqCst), 1);
        assert_eq!(filtered_fires.load(Ordering::SeqCst), 0);

        let delivered = bus.emit(&MirrorEvent::OrderCreated(fixtures::order("o2", 200)));
        assert_eq!(delivered, 2, "both listeners fire for amount 200");
        assert_eq!(plain_fires.load(Ordering::SeqCst), 2);
        assert_eq!(filtered_fires.load(Ordering::SeqCst), 1);
    }

    // =========================================================================
    // ORDERING & ISOLATION
    // =========================================================================

    #[test]
    fn test_delivery_follows_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(EventKind::AgentRegistered, move |_| {
                order.lock().unwrap().push(tag);
            });
        }

        bus.emit(&MirrorEvent::AgentRegistered(fixtures::agent("a1", "alpha")));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_listener_does_not_block_siblings() {
        let bus = EventBus::new();
        let later_fired = Arc::new(AtomicUsize::new(0));

        bus.subscribe(EventKind::AgentRegistered, |_| panic!("listener bug"));
        let later = Arc::clone(&later_fired);
        bus.subscribe(EventKind::AgentRegistered, move |_| {
            later.fetch_add(1, Ordering::SeqCst);
        });

        let event = MirrorEvent::AgentRegistered(fixtures::agent("a1", "alpha"));
        bus.emit(&event);
        assert_eq!(later_fired.load(Ordering::SeqCst), 1);

        // The faulty subscription stays active; a second emission takes
        // the same path and siblings still fire.
        bus.emit(&event);
        assert_eq!(later_fired.load(Ordering::SeqCst), 2);
        assert_eq!(bus.subscriptions().len(), 2);
    }

    #[test]
    fn test_kind_routing_is_exact() {
        let bus = EventBus::new();
        let fires = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fires);
        bus.subscribe(EventKind::MessageSent, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&MirrorEvent::MessageReceived(fixtures::message("m1", "c1")));
        assert_eq!(fires.load(Ordering::SeqCst), 0);

        bus.emit(&MirrorEvent::MessageSent(fixtures::message("m2", "c1")));
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    // =========================================================================
    // SUBSCRIPTION LIFECYCLE
    // =========================================================================

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let id = bus.subscribe(EventKind::AgentRegistered, |_| {});

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id), "second call is a no-op");
        assert!(bus.subscriptions().is_empty());

        bus.emit(&MirrorEvent::AgentRegistered(fixtures::agent("a1", "alpha")));
    }

    #[test]
    fn test_subscription_ids_never_recycle() {
        let bus = EventBus::new();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..50 {
            let id = bus.subscribe(EventKind::AgentRegistered, |_| {});
            assert!(seen.insert(id), "id {id} was reused");
            bus.unsubscribe(id);
        }
    }

    #[test]
    fn test_unsubscribed_listener_stops_firing_mid_stream() {
        let bus = Arc::new(EventBus::new());
        let fires = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fires);
        let id = bus.subscribe(EventKind::OrderCreated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&MirrorEvent::OrderCreated(fixtures::order("o1", 10)));
        bus.unsubscribe(id);
        bus.emit(&MirrorEvent::OrderCreated(fixtures::order("o2", 10)));

        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    // =========================================================================
    // STREAM BRIDGE
    // =========================================================================

    #[tokio::test]
    async fn test_stream_receives_matching_events() {
        use tokio_stream::StreamExt;

        let bus = Arc::new(EventBus::new());
        let mut stream = bus.stream(EventKind::AgentRegistered);

        bus.emit(&MirrorEvent::AgentRegistered(fixtures::agent("a1", "alpha")));
        bus.emit(&MirrorEvent::OrderCreated(fixtures::order("o1", 10)));
        bus.emit(&MirrorEvent::AgentRegistered(fixtures::agent("a2", "beta")));

        let first = stream.next().await.unwrap();
        assert!(matches!(first, MirrorEvent::AgentRegistered(r) if r.id == "a1"));
        let second = stream.next().await.unwrap();
        assert!(matches!(second, MirrorEvent::AgentRegistered(r) if r.id == "a2"));
    }
}
