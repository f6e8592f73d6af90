//! Subscription records and handles.

use mirror_types::{EventKind, MirrorEvent, Timestamp};
use std::fmt;
use std::sync::Arc;

/// Listener callback invoked for each delivered event.
pub type Listener = Arc<dyn Fn(&MirrorEvent) + Send + Sync>;

/// Optional payload predicate; the listener fires only when the filter
/// is absent or returns true.
pub type EventFilter = Arc<dyn Fn(&MirrorEvent) -> bool + Send + Sync>;

/// Identifier for one subscription, unique for the process lifetime.
///
/// Ids are allocated from a monotonic counter, so they double as the
/// registration order used during dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One registered subscription.
///
/// `active` transitions one-way from true to false and never back.
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) kind: EventKind,
    pub(crate) listener: Listener,
    pub(crate) filter: Option<EventFilter>,
    pub(crate) active: bool,
    pub(crate) created_at: Timestamp,
}

impl Subscription {
    /// Whether this subscription is a live candidate for `kind`.
    ///
    /// The filter is deliberately not consulted here: it runs in the
    /// dispatch loop, outside the registry lock and inside the same
    /// panic boundary as the listener.
    pub(crate) fn wants_kind(&self, kind: EventKind) -> bool {
        self.active && self.kind == kind
    }
}

/// Introspection view of a subscription, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionInfo {
    /// The subscription id.
    pub id: SubscriptionId,
    /// Event kind the subscription listens to.
    pub kind: EventKind,
    /// Whether a payload filter is attached.
    pub filtered: bool,
    /// When the subscription was registered.
    pub created_at: Timestamp,
}
