//! # Mirror Bus - Typed Publish/Subscribe
//!
//! In-process notification registry binding event kinds to listener
//! callbacks with optional per-subscription filters.
//!
//! ## Delivery Contract
//!
//! - `emit()` runs every matching listener **synchronously**, in
//!   subscription-registration order, before returning.
//! - A panicking listener is caught and logged at the emission boundary;
//!   delivery continues to the remaining listeners and the subscription
//!   stays active.
//! - Subscriptions deactivate exactly once (`active → removed`) and are
//!   never reactivated; a second `unsubscribe` is a no-op.
//!
//! The synchronous contract is what gives coordinator listeners
//! read-your-write visibility into the cache.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod subscription;

// Re-export main types
pub use bus::{EventBus, EventStream};
pub use subscription::{EventFilter, Listener, SubscriptionId, SubscriptionInfo};

/// Default soft cap on listeners per event kind before a warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 100;
