//! # Mirrored Domain Records
//!
//! Local copies of records sourced from the upstream protocol. Each
//! record carries its own identity, the owning actor address, a status
//! category, and creation/update timestamps.
//!
//! Cross-record references (`MessageRecord::channel_id`,
//! `WorkOrder::listing_id`, ...) are foreign keys only; this layer never
//! cascades deletes across them.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-chain address of an actor (agent owner, client, participant).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorAddress(String);

impl ActorAddress {
    /// Wrap a raw address string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The raw address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

// ============================================================================
// Agents
// ============================================================================

/// Lifecycle status of a registered agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered and available for work.
    #[default]
    Active,
    /// Registered but currently occupied.
    Busy,
    /// Deactivated by its owner; kept for history.
    Deactivated,
}

/// A registered agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Protocol-assigned agent identity.
    pub id: String,
    /// Address of the owning actor.
    pub owner: ActorAddress,
    /// Human-readable agent name.
    pub name: String,
    /// Advertised capability tags.
    pub capabilities: Vec<String>,
    /// Current lifecycle status.
    pub status: AgentStatus,
    /// When the record was created upstream.
    pub created_at: Timestamp,
    /// When the record was last updated upstream.
    pub updated_at: Timestamp,
}

// ============================================================================
// Channels & Messages
// ============================================================================

/// Lifecycle status of a communication channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Open for messages.
    #[default]
    Open,
    /// Archived; no further messages expected.
    Archived,
}

/// A communication channel between actors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Protocol-assigned channel identity.
    pub id: String,
    /// Address of the creating actor.
    pub owner: ActorAddress,
    /// Channel display name.
    pub name: String,
    /// Current participant addresses.
    pub participants: Vec<ActorAddress>,
    /// Current lifecycle status.
    pub status: ChannelStatus,
    /// When the record was created upstream.
    pub created_at: Timestamp,
    /// When the record was last updated upstream.
    pub updated_at: Timestamp,
}

/// Delivery status of a channel message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Accepted by the protocol.
    #[default]
    Sent,
    /// Observed by the receiving side.
    Delivered,
    /// Read by a recipient.
    Read,
}

/// A message within a channel.
///
/// `channel_id` is a non-owning reference: deleting the channel record
/// leaves its messages in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Protocol-assigned message identity.
    pub id: String,
    /// Identity of the channel this message belongs to.
    pub channel_id: String,
    /// Sending actor.
    pub sender: ActorAddress,
    /// Message body.
    pub body: String,
    /// Current delivery status.
    pub status: MessageStatus,
    /// When the record was created upstream.
    pub created_at: Timestamp,
    /// When the record was last updated upstream.
    pub updated_at: Timestamp,
}

// ============================================================================
// Service Listings & Work Orders
// ============================================================================

/// Lifecycle status of a service listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Visible and purchasable.
    #[default]
    Listed,
    /// Temporarily hidden by the owner.
    Paused,
    /// Removed from the marketplace.
    Delisted,
}

/// A service offered by an agent on the marketplace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceListing {
    /// Protocol-assigned listing identity.
    pub id: String,
    /// Address of the offering agent's owner.
    pub owner: ActorAddress,
    /// Listing title.
    pub title: String,
    /// Listing description.
    pub description: String,
    /// Price in base protocol units.
    pub price: u64,
    /// Current lifecycle status.
    pub status: ListingStatus,
    /// When the record was created upstream.
    pub created_at: Timestamp,
    /// When the record was last updated upstream.
    pub updated_at: Timestamp,
}

/// Lifecycle status of a work order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting acceptance.
    #[default]
    Created,
    /// Accepted and being worked.
    InProgress,
    /// Work delivered and accepted.
    Completed,
    /// Cancelled by either side.
    Cancelled,
}

/// A work order placed against a service listing.
///
/// `listing_id`, `client`, and `agent` are non-owning references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Protocol-assigned order identity.
    pub id: String,
    /// Identity of the listing this order was placed against.
    pub listing_id: String,
    /// Address of the purchasing actor.
    pub client: ActorAddress,
    /// Address of the fulfilling agent.
    pub agent: ActorAddress,
    /// Agreed amount in base protocol units.
    pub amount: u64,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// When the record was created upstream.
    pub created_at: Timestamp,
    /// When the record was last updated upstream.
    pub updated_at: Timestamp,
}

// ============================================================================
// Non-Mirrored Notification Payloads
// ============================================================================

/// Notification payload for payment events.
///
/// Payments are not mirrored into the cache; the receipt exists only as
/// an event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Protocol-assigned payment identity.
    pub id: String,
    /// The work order this payment settles.
    pub order_id: String,
    /// Paying actor.
    pub payer: ActorAddress,
    /// Receiving actor.
    pub payee: ActorAddress,
    /// Amount in base protocol units.
    pub amount: u64,
    /// When the payment was observed.
    pub timestamp: Timestamp,
}

/// Notification payload for escrow events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowNotice {
    /// Protocol-assigned escrow identity.
    pub id: String,
    /// The work order this escrow secures.
    pub order_id: String,
    /// Escrowed amount in base protocol units.
    pub amount: u64,
    /// When the escrow change was observed.
    pub timestamp: Timestamp,
}

/// Notification payload for reputation changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationDelta {
    /// Address of the affected agent's owner.
    pub agent: ActorAddress,
    /// Signed change applied to the score.
    pub delta: i64,
    /// Resulting score after the change.
    pub score: u64,
    /// When the change was observed.
    pub timestamp: Timestamp,
}

/// Payload for terminal error notifications.
///
/// Asynchronous failures (reconnect exhaustion, transport errors) are
/// surfaced exclusively through this payload on the bus; there is no
/// parallel error-return channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemErrorReport {
    /// Component that produced the error.
    pub source: String,
    /// Human-readable description.
    pub message: String,
    /// When the error was raised.
    pub timestamp: Timestamp,
}
