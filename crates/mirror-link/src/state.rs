//! Link state machine.
//!
//! The transition core is a pure, deterministic function so the whole
//! connection lifecycle can be tested without timers or a transport.

/// Logical connection state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkState {
    /// No session; nothing scheduled.
    #[default]
    Disconnected,
    /// Initial handshake in flight.
    Connecting,
    /// Session established; heartbeats running.
    Connected,
    /// Session lost; retry `attempt` is scheduled or in flight.
    Reconnecting {
        /// Retry attempt number, counted from 1.
        attempt: u32,
    },
}

impl LinkState {
    /// Whether a session is currently established.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Events that drive link state transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// `start()` was called.
    StartRequested,
    /// The initial handshake succeeded.
    HandshakeSucceeded,
    /// The initial handshake failed.
    HandshakeFailed,
    /// A heartbeat probe failed; hard transport errors surface through
    /// this path too, since probing is how the session is observed.
    ProbeFailed,
    /// A reconnect attempt succeeded.
    RetrySucceeded,
    /// A reconnect attempt failed.
    RetryFailed,
    /// `stop()` was called.
    StopRequested,
}

/// Deterministic link state machine with capped retry attempts.
///
/// The async driver owns the clock and the transport; this core only
/// answers "given this state and this event, what next".
#[derive(Debug)]
pub struct LinkStateMachine {
    state: LinkState,
    max_attempts: u32,
    /// Failures since the last successful handshake or retry.
    consecutive_failures: u64,
    /// Sessions established over the machine's lifetime.
    sessions_established: u64,
}

impl LinkStateMachine {
    /// Create a machine allowing `max_attempts` reconnect attempts per
    /// outage.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: LinkState::Disconnected,
            max_attempts,
            consecutive_failures: 0,
            sessions_established: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Failures since the last established session.
    #[must_use]
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    /// Sessions established over the machine's lifetime.
    #[must_use]
    pub fn sessions_established(&self) -> u64 {
        self.sessions_established
    }

    /// Process an event and transition state.
    pub fn process_event(&mut self, event: LinkEvent) -> LinkState {
        let new_state = self.next_state(event);

        match event {
            LinkEvent::HandshakeFailed | LinkEvent::ProbeFailed | LinkEvent::RetryFailed => {
                self.consecutive_failures += 1;
            }
            LinkEvent::HandshakeSucceeded | LinkEvent::RetrySucceeded => {
                self.consecutive_failures = 0;
                self.sessions_established += 1;
            }
            LinkEvent::StartRequested | LinkEvent::StopRequested => {}
        }

        self.state = new_state;
        new_state
    }

    /// Pure transition function.
    fn next_state(&self, event: LinkEvent) -> LinkState {
        match (self.state, event) {
            // Stop wins from anywhere.
            (_, LinkEvent::StopRequested) => LinkState::Disconnected,

            (LinkState::Disconnected, LinkEvent::StartRequested) => LinkState::Connecting,

            (LinkState::Connecting, LinkEvent::HandshakeSucceeded) => LinkState::Connected,
            (LinkState::Connecting, LinkEvent::HandshakeFailed) => {
                if self.max_attempts == 0 {
                    LinkState::Disconnected
                } else {
                    LinkState::Reconnecting { attempt: 1 }
                }
            }

            (LinkState::Connected, LinkEvent::ProbeFailed) => {
                if self.max_attempts == 0 {
                    LinkState::Disconnected
                } else {
                    LinkState::Reconnecting { attempt: 1 }
                }
            }

            (LinkState::Reconnecting { .. }, LinkEvent::RetrySucceeded) => LinkState::Connected,
            (LinkState::Reconnecting { attempt }, LinkEvent::RetryFailed) => {
                if attempt >= self.max_attempts {
                    LinkState::Disconnected
                } else {
                    LinkState::Reconnecting {
                        attempt: attempt + 1,
                    }
                }
            }

            // No-op transitions (stay in current state).
            (state, _) => state,
        }
    }
}

/// Delay before reconnect attempt `attempt` (counted from 1):
/// `base * 2^(attempt - 1)`, saturating.
#[must_use]
pub fn backoff_delay(base: std::time::Duration, attempt: u32) -> std::time::Duration {
    let shift = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << shift)
}
