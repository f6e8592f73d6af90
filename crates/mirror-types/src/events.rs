//! # Mirror Events
//!
//! Defines the typed event catalogue that flows through the mirror bus.
//! One variant per notification the hosting runtime can react to; the
//! payload shape follows the corresponding record in `records.rs`.

use crate::records::{
    AgentRecord, ChannelRecord, EscrowNotice, MessageRecord, PaymentReceipt, ReputationDelta,
    ServiceListing, SystemErrorReport, WorkOrder,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// All events that can be emitted on the mirror bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MirrorEvent {
    // =========================================================================
    // AGENTS
    // =========================================================================
    /// A new agent was registered upstream.
    AgentRegistered(AgentRecord),
    /// An existing agent record changed.
    AgentUpdated(AgentRecord),
    /// An agent was deactivated by its owner.
    AgentDeactivated(AgentRecord),

    // =========================================================================
    // SERVICE LISTINGS
    // =========================================================================
    /// A service was listed on the marketplace.
    ServiceListed(ServiceListing),
    /// A listing's terms or status changed.
    ServiceUpdated(ServiceListing),
    /// A listing was removed from the marketplace.
    ServiceDelisted(ServiceListing),

    // =========================================================================
    // WORK ORDERS
    // =========================================================================
    /// A work order was created against a listing.
    OrderCreated(WorkOrder),
    /// A work order's status or terms changed.
    OrderUpdated(WorkOrder),
    /// A work order was completed and accepted.
    OrderCompleted(WorkOrder),
    /// A work order was cancelled.
    OrderCancelled(WorkOrder),

    // =========================================================================
    // CHANNELS & MESSAGES
    // =========================================================================
    /// A message was sent by a local actor.
    MessageSent(MessageRecord),
    /// A message addressed to a local actor arrived.
    MessageReceived(MessageRecord),
    /// A channel was created.
    ChannelCreated(ChannelRecord),
    /// A channel's metadata changed.
    ChannelUpdated(ChannelRecord),
    /// An actor joined a channel.
    ChannelJoined(ChannelRecord),
    /// An actor left a channel.
    ChannelLeft(ChannelRecord),

    // =========================================================================
    // PAYMENTS, ESCROW, REPUTATION (emit-only; not mirrored)
    // =========================================================================
    /// A payment was processed into escrow.
    PaymentProcessed(PaymentReceipt),
    /// An escrowed payment was released to the payee.
    PaymentReleased(PaymentReceipt),
    /// An escrow account was created for an order.
    EscrowCreated(EscrowNotice),
    /// An escrow entered dispute.
    EscrowDisputed(EscrowNotice),
    /// An agent's reputation score changed.
    ReputationUpdated(ReputationDelta),

    // =========================================================================
    // SYSTEM & CONNECTION
    // =========================================================================
    /// A terminal asynchronous failure.
    SystemError(SystemErrorReport),
    /// The upstream link completed its initial handshake.
    ConnectionEstablished,
    /// The upstream link was lost; reconnection is in progress.
    ConnectionLost,
    /// The upstream link was re-established after loss.
    ConnectionReconnected,
}

impl MirrorEvent {
    /// The discriminant for this event, used for subscription routing.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AgentRegistered(_) => EventKind::AgentRegistered,
            Self::AgentUpdated(_) => EventKind::AgentUpdated,
            Self::AgentDeactivated(_) => EventKind::AgentDeactivated,
            Self::ServiceListed(_) => EventKind::ServiceListed,
            Self::ServiceUpdated(_) => EventKind::ServiceUpdated,
            Self::ServiceDelisted(_) => EventKind::ServiceDelisted,
            Self::OrderCreated(_) => EventKind::OrderCreated,
            Self::OrderUpdated(_) => EventKind::OrderUpdated,
            Self::OrderCompleted(_) => EventKind::OrderCompleted,
            Self::OrderCancelled(_) => EventKind::OrderCancelled,
            Self::MessageSent(_) => EventKind::MessageSent,
            Self::MessageReceived(_) => EventKind::MessageReceived,
            Self::ChannelCreated(_) => EventKind::ChannelCreated,
            Self::ChannelUpdated(_) => EventKind::ChannelUpdated,
            Self::ChannelJoined(_) => EventKind::ChannelJoined,
            Self::ChannelLeft(_) => EventKind::ChannelLeft,
            Self::PaymentProcessed(_) => EventKind::PaymentProcessed,
            Self::PaymentReleased(_) => EventKind::PaymentReleased,
            Self::EscrowCreated(_) => EventKind::EscrowCreated,
            Self::EscrowDisputed(_) => EventKind::EscrowDisputed,
            Self::ReputationUpdated(_) => EventKind::ReputationUpdated,
            Self::SystemError(_) => EventKind::SystemError,
            Self::ConnectionEstablished => EventKind::ConnectionEstablished,
            Self::ConnectionLost => EventKind::ConnectionLost,
            Self::ConnectionReconnected => EventKind::ConnectionReconnected,
        }
    }
}

/// Fieldless discriminant for [`MirrorEvent`].
///
/// `Display` renders the wire name (`"agent:registered"`), matching the
/// catalogue the hosting runtime consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AgentRegistered,
    AgentUpdated,
    AgentDeactivated,
    ServiceListed,
    ServiceUpdated,
    ServiceDelisted,
    OrderCreated,
    OrderUpdated,
    OrderCompleted,
    OrderCancelled,
    MessageSent,
    MessageReceived,
    ChannelCreated,
    ChannelUpdated,
    ChannelJoined,
    ChannelLeft,
    PaymentProcessed,
    PaymentReleased,
    EscrowCreated,
    EscrowDisputed,
    ReputationUpdated,
    SystemError,
    ConnectionEstablished,
    ConnectionLost,
    ConnectionReconnected,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AgentRegistered => "agent:registered",
            Self::AgentUpdated => "agent:updated",
            Self::AgentDeactivated => "agent:deactivated",
            Self::ServiceListed => "service:listed",
            Self::ServiceUpdated => "service:updated",
            Self::ServiceDelisted => "service:delisted",
            Self::OrderCreated => "order:created",
            Self::OrderUpdated => "order:updated",
            Self::OrderCompleted => "order:completed",
            Self::OrderCancelled => "order:cancelled",
            Self::MessageSent => "message:sent",
            Self::MessageReceived => "message:received",
            Self::ChannelCreated => "channel:created",
            Self::ChannelUpdated => "channel:updated",
            Self::ChannelJoined => "channel:joined",
            Self::ChannelLeft => "channel:left",
            Self::PaymentProcessed => "payment:processed",
            Self::PaymentReleased => "payment:released",
            Self::EscrowCreated => "escrow:created",
            Self::EscrowDisputed => "escrow:disputed",
            Self::ReputationUpdated => "reputation:updated",
            Self::SystemError => "system:error",
            Self::ConnectionEstablished => "connection:established",
            Self::ConnectionLost => "connection:lost",
            Self::ConnectionReconnected => "connection:reconnected",
        };
        f.write_str(name)
    }
}

/// A mirrored record extracted from an upstream event.
///
/// This is the value type the coordinator writes into the cache. The
/// cache itself treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPayload {
    /// An agent record.
    Agent(AgentRecord),
    /// A channel record.
    Channel(ChannelRecord),
    /// A message record.
    Message(MessageRecord),
    /// A service listing.
    Listing(ServiceListing),
    /// A work order.
    Order(WorkOrder),
}
