//! Upstream transport port.
//!
//! The mirror consumes exactly three capabilities from the protocol
//! client: `connect()`, `probe()`, and a raw-event feed (wired as a
//! channel by the runtime). Everything else about the transport is
//! out of scope here.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the upstream transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The initial or retry handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A liveness probe failed or timed out.
    #[error("probe failed: {0}")]
    Probe(String),

    /// The transport reported itself closed.
    #[error("transport closed: {0}")]
    Closed(String),
}

/// Port for the upstream protocol client.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Perform a handshake, establishing the logical session.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Lightweight liveness probe against the established session.
    async fn probe(&self) -> Result<(), TransportError>;
}
