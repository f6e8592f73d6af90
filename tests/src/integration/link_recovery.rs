//! # Link Recovery Tests
//!
//! Drives the connection manager against scripted transports on the
//! paused tokio clock: backoff growth, retry exhaustion, heartbeat
//! failure recovery, and stop() cancellation.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use mirror_bus::EventBus;
    use mirror_link::testing::MockTransport;
    use mirror_link::{backoff_delay, ConnectionManager, LinkConfig, LinkState, TransportError};
    use mirror_types::{EventKind, MirrorEvent};

    fn config(attempts: u32) -> LinkConfig {
        LinkConfig {
            reconnect_attempts: attempts,
            reconnect_delay: Duration::from_millis(100),
            heartbeat_interval: Duration::from_millis(1_000),
        }
    }

    fn manager(transport: Arc<MockTransport>, bus: Arc<EventBus>, attempts: u32) -> Arc<ConnectionManager> {
        Arc::new(ConnectionManager::new(transport, bus, config(attempts)))
    }

    fn counter(bus: &EventBus, kind: EventKind) -> Arc<AtomicU64> {
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = Arc::clone(&count);
        bus.subscribe(kind, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    // =========================================================================
    // BACKOFF
    // =========================================================================

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(400));
        assert_eq!(backoff_delay(base, 5), Duration::from_millis(1_600));
    }

    #[test]
    fn test_backoff_saturates_instead_of_overflowing() {
        let base = Duration::from_secs(1);
        let huge = backoff_delay(base, 200);
        assert!(huge >= backoff_delay(base, 32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_wait_the_full_backoff_schedule() {
        let transport = Arc::new(MockTransport::flaky_connects(3));
        let bus = Arc::new(EventBus::new());
        let manager = manager(Arc::clone(&transport), bus, 5);

        let started = tokio::time::Instant::now();
        assert_eq!(manager.start().await, LinkState::Connected);

        // 100 + 200 + 400ms of backoff before the successful 4th attempt.
        assert_eq!(started.elapsed(), Duration::from_millis(700));
        assert_eq!(transport.connect_calls(), 4);
        manager.stop();
    }

    // =========================================================================
    // EXHAUSTION (Scenario D shape)
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_settles_disconnected_with_one_error() {
        let transport = Arc::new(MockTransport::dead());
        let bus = Arc::new(EventBus::new());
        let errors = counter(&bus, EventKind::SystemError);
        let established = counter(&bus, EventKind::ConnectionEstablished);
        let manager = manager(Arc::clone(&transport), bus, 3);

        assert_eq!(manager.start().await, LinkState::Disconnected);

        // Initial handshake plus exactly three retries, then nothing.
        assert_eq!(transport.connect_calls(), 4);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(established.load(Ordering::SeqCst), 0);

        // No 4th attempt is scheduled after settling.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connect_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_fails_terminally_on_first_error() {
        let transport = Arc::new(MockTransport::dead());
        let bus = Arc::new(EventBus::new());
        let errors = counter(&bus, EventKind::SystemError);
        let manager = manager(Arc::clone(&transport), bus, 0);

        assert_eq!(manager.start().await, LinkState::Disconnected);
        assert_eq!(transport.connect_calls(), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    // =========================================================================
    // HEARTBEAT-DRIVEN RECOVERY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_triggers_reconnect() {
        let transport = Arc::new(MockTransport::healthy());
        transport.script_probes(vec![Ok(()), Err(TransportError::Probe("timeout".into()))]);

        let bus = Arc::new(EventBus::new());
        let lost = counter(&bus, EventKind::ConnectionLost);
        let reconnected = counter(&bus, EventKind::ConnectionReconnected);
        let manager = manager(Arc::clone(&transport), bus, 3);

        assert_eq!(manager.start().await, LinkState::Connected);

        // Two probe intervals: the first probe passes, the second fails
        // and kicks off a reconnect that succeeds on its first attempt.
        tokio::time::sleep(Duration::from_millis(2_200)).await;
        tokio::task::yield_now().await;

        assert_eq!(lost.load(Ordering::SeqCst), 1);
        assert_eq!(reconnected.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), LinkState::Connected);
        manager.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_established_then_lost_then_reconnected_sequence() {
        let transport = Arc::new(MockTransport::healthy());
        transport.script_probes(vec![Err(TransportError::Probe("gone".into()))]);

        let bus = Arc::new(EventBus::new());
        let sequence = Arc::new(std::sync::Mutex::new(Vec::new()));
        for kind in [
            EventKind::ConnectionEstablished,
            EventKind::ConnectionLost,
            EventKind::ConnectionReconnected,
        ] {
            let sequence = Arc::clone(&sequence);
            bus.subscribe(kind, move |event| {
                sequence.lock().unwrap().push(event.kind());
            });
        }
        let manager = manager(transport, bus, 3);

        manager.start().await;
        tokio::time::sleep(Duration::from_millis(1_200)).await;
        tokio::task::yield_now().await;
        manager.stop();

        assert_eq!(
            *sequence.lock().unwrap(),
            vec![
                EventKind::ConnectionEstablished,
                EventKind::ConnectionLost,
                EventKind::ConnectionReconnected,
            ]
        );
    }

    // =========================================================================
    // STOP
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_silent() {
        let transport = Arc::new(MockTransport::healthy());
        let bus = Arc::new(EventBus::new());
        let errors = counter(&bus, EventKind::SystemError);
        let manager = manager(transport, bus, 3);

        manager.start().await;
        manager.stop();
        manager.stop();

        assert_eq!(manager.state(), LinkState::Disconnected);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_link_probes_no_further() {
        let transport = Arc::new(MockTransport::healthy());
        let bus = Arc::new(EventBus::new());
        let manager = manager(Arc::clone(&transport), bus, 3);

        manager.start().await;
        manager.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.probe_calls(), 0);
    }
}
