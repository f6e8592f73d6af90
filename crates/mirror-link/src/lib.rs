//! # Mirror Link - Upstream Connection Manager
//!
//! Maintains a logical connected/disconnected state against the upstream
//! transport, retries failed handshakes with capped exponential backoff,
//! and probes liveness with periodic heartbeats while connected.
//!
//! ## State Machine
//!
//! ```text
//! [DISCONNECTED] ──start()──→ [CONNECTING]
//!        ↑                         │
//!        │           ┌─ success ───┴── failure (retries left) ─┐
//!        │           ▼                                         ▼
//!        │      [CONNECTED] ──probe/transport failure──→ [RECONNECTING]
//!        │           ↑                                         │
//!        │           └────────── retry success ────────────────┤
//!        │                                                     │
//!        └───────────────── retries exhausted ─────────────────┘
//! ```
//!
//! Retry exhaustion never crashes the process: it is reported once as a
//! `system:error` event and the manager settles in `DISCONNECTED`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod manager;
pub mod state;
pub mod testing;
pub mod transport;

// Re-export main types
pub use manager::{ConnectionManager, LinkConfig};
pub use state::{backoff_delay, LinkEvent, LinkState, LinkStateMachine};
pub use transport::{TransportError, UpstreamTransport};
