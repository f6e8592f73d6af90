//! Test doubles for the transport port.
//!
//! Shared by this crate's unit tests and the workspace integration
//! suite, so it ships as a normal module rather than `#[cfg(test)]`.

use crate::transport::{TransportError, UpstreamTransport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted transport: each call pops the next scripted result; an
/// empty script means success.
#[derive(Default)]
pub struct MockTransport {
    connect_script: Mutex<VecDeque<Result<(), TransportError>>>,
    probe_script: Mutex<VecDeque<Result<(), TransportError>>>,
    probe_delay: Mutex<Option<Duration>>,
    connect_calls: AtomicU64,
    probe_calls: AtomicU64,
}

impl MockTransport {
    /// A transport that always succeeds.
    #[must_use]
    pub fn healthy() -> Self {
        Self::default()
    }

    /// A transport whose first `failures` handshakes fail, then succeed.
    #[must_use]
    pub fn flaky_connects(failures: usize) -> Self {
        let transport = Self::default();
        transport.script_connects(
            (0..failures)
                .map(|i| Err(TransportError::Handshake(format!("scripted failure {i}"))))
                .collect(),
        );
        transport
    }

    /// A transport whose handshake always fails.
    #[must_use]
    pub fn dead() -> Self {
        let transport = Self::default();
        // A long script outlasts any bounded retry cycle.
        transport.script_connects(
            (0..1_000)
                .map(|_| Err(TransportError::Handshake("unreachable".into())))
                .collect(),
        );
        transport
    }

    /// Replace the handshake script.
    pub fn script_connects(&self, script: Vec<Result<(), TransportError>>) {
        *self.connect_script.lock().expect("connect script poisoned") = script.into();
    }

    /// Replace the probe script.
    pub fn script_probes(&self, script: Vec<Result<(), TransportError>>) {
        *self.probe_script.lock().expect("probe script poisoned") = script.into();
    }

    /// Make every probe take `delay` before resolving.
    pub fn set_probe_delay(&self, delay: Duration) {
        *self.probe_delay.lock().expect("probe delay poisoned") = Some(delay);
    }

    /// Handshakes attempted so far.
    #[must_use]
    pub fn connect_calls(&self) -> u64 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Probes attempted so far.
    #[must_use]
    pub fn probe_calls(&self) -> u64 {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamTransport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_script
            .lock()
            .expect("connect script poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn probe(&self) -> Result<(), TransportError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.probe_delay.lock().expect("probe delay poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.probe_script
            .lock()
            .expect("probe script poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
