//! # Connection Manager
//!
//! Async driver around [`LinkStateMachine`]: owns the transport port,
//! runs the heartbeat loop while connected, and schedules capped
//! exponential-backoff reconnection. All lifecycle outcomes are
//! published on the event bus; nothing here returns an error to the
//! caller.

use crate::state::{backoff_delay, LinkEvent, LinkState, LinkStateMachine};
use crate::transport::UpstreamTransport;
use mirror_bus::EventBus;
use mirror_types::{MirrorEvent, SystemErrorReport, SystemTimeSource, TimeSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Connection manager configuration.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Maximum reconnect attempts per outage.
    pub reconnect_attempts: u32,
    /// Backoff base: attempt `n` waits `reconnect_delay * 2^(n-1)`.
    pub reconnect_delay: Duration,
    /// Interval between heartbeat probes while connected.
    pub heartbeat_interval: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Drives the upstream link lifecycle.
///
/// Share behind an `Arc`; `start()` and `stop()` are the only entry
/// points the coordinator uses.
pub struct ConnectionManager {
    transport: Arc<dyn UpstreamTransport>,
    bus: Arc<EventBus>,
    time: Arc<dyn TimeSource>,
    config: LinkConfig,
    machine: Mutex<LinkStateMachine>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Create a manager on the system clock.
    #[must_use]
    pub fn new(transport: Arc<dyn UpstreamTransport>, bus: Arc<EventBus>, config: LinkConfig) -> Self {
        Self::with_time_source(transport, bus, config, Arc::new(SystemTimeSource::new()))
    }

    /// Create a manager on an injected clock.
    #[must_use]
    pub fn with_time_source(
        transport: Arc<dyn UpstreamTransport>,
        bus: Arc<EventBus>,
        config: LinkConfig,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let machine = LinkStateMachine::new(config.reconnect_attempts);
        Self {
            transport,
            bus,
            time,
            config,
            machine: Mutex::new(machine),
            heartbeat: Mutex::new(None),
        }
    }

    /// Current logical connection state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.machine.lock().expect("link machine poisoned").state()
    }

    fn apply(&self, event: LinkEvent) -> LinkState {
        self.machine
            .lock()
            .expect("link machine poisoned")
            .process_event(event)
    }

    /// Start the link: handshake, retry per backoff on failure, and run
    /// heartbeats once connected.
    ///
    /// Completes when the link is established or retries are exhausted.
    /// Exhaustion is surfaced as a single `system:error` event, never as
    /// a return value.
    pub async fn start(self: &Arc<Self>) -> LinkState {
        if self.state() != LinkState::Disconnected {
            warn!(state = ?self.state(), "start() called while already running");
            return self.state();
        }

        self.apply(LinkEvent::StartRequested);
        info!("Connecting to upstream");

        match self.transport.connect().await {
            Ok(()) => {
                self.apply(LinkEvent::HandshakeSucceeded);
                info!("Upstream connection established");
                self.bus.emit(&MirrorEvent::ConnectionEstablished);
                self.spawn_heartbeat();
            }
            Err(e) => {
                warn!(error = %e, "Initial handshake failed");
                let state = self.apply(LinkEvent::HandshakeFailed);
                match state {
                    LinkState::Reconnecting { .. } => {
                        if self.reconnect_cycle().await {
                            self.spawn_heartbeat();
                        }
                    }
                    // Zero configured attempts: terminal straight away.
                    LinkState::Disconnected => self.emit_terminal_error(&e.to_string()),
                    _ => {}
                }
            }
        }

        self.state()
    }

    /// Stop the link: cancel the heartbeat task and any pending backoff
    /// timer it carries, and settle in `Disconnected`. Idempotent; never
    /// emits an error.
    pub fn stop(&self) {
        self.apply(LinkEvent::StopRequested);
        let handle = self
            .heartbeat
            .lock()
            .expect("heartbeat handle poisoned")
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!("Heartbeat task cancelled");
        }
        info!("Upstream link stopped");
    }

    /// Run the capped backoff retry cycle. Returns true once a retry
    /// succeeds; on exhaustion emits exactly one `system:error` and
    /// returns false.
    async fn reconnect_cycle(&self) -> bool {
        loop {
            // stop() moves the machine out of Reconnecting; a pending
            // backoff wait then lapses without another attempt.
            let LinkState::Reconnecting { attempt } = self.state() else {
                return false;
            };

            let delay = backoff_delay(self.config.reconnect_delay, attempt);
            info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect attempt");
            tokio::time::sleep(delay).await;

            if !matches!(self.state(), LinkState::Reconnecting { .. }) {
                return false;
            }

            match self.transport.connect().await {
                Ok(()) => {
                    self.apply(LinkEvent::RetrySucceeded);
                    info!(attempt, "Upstream connection re-established");
                    self.bus.emit(&MirrorEvent::ConnectionReconnected);
                    return true;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Reconnect attempt failed");
                    if self.apply(LinkEvent::RetryFailed) == LinkState::Disconnected {
                        self.emit_terminal_error(&format!(
                            "reconnect attempts exhausted after {attempt} tries: {e}"
                        ));
                        return false;
                    }
                }
            }
        }
    }

    /// Spawn the heartbeat loop for the current session.
    fn spawn_heartbeat(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            manager.heartbeat_loop().await;
        });
        *self.heartbeat.lock().expect("heartbeat handle poisoned") = Some(handle);
    }

    /// Probe liveness every `heartbeat_interval` while connected.
    ///
    /// Probes serialize: the next tick is not armed until the in-flight
    /// probe resolves, so a slow probe delays rather than stacks.
    async fn heartbeat_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the first probe should wait
        // one full interval after the handshake.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !self.state().is_connected() {
                break;
            }

            match self.transport.probe().await {
                Ok(()) => debug!("Heartbeat probe ok"),
                Err(e) => {
                    warn!(error = %e, "Heartbeat probe failed, reconnecting");
                    self.apply(LinkEvent::ProbeFailed);
                    self.bus.emit(&MirrorEvent::ConnectionLost);

                    if self.reconnect_cycle().await {
                        ticker.reset();
                    } else {
                        break;
                    }
                }
            }
        }
    }

    /// Surface a terminal failure once, through the bus only.
    fn emit_terminal_error(&self, message: &str) {
        warn!(message, "Upstream link gave up");
        self.bus.emit(&MirrorEvent::SystemError(SystemErrorReport {
            source: "connection-manager".to_string(),
            message: message.to_string(),
            timestamp: self.time.now(),
        }));
    }
}
