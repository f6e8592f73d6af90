//! # Mirror Runtime
//!
//! Wires the cache store, event bus, and connection manager into one
//! explicitly constructed mirror node. The node is the only component
//! that touches both the cache and the bus, and it enforces the core
//! ordering guarantee: for every upstream event, the cache write
//! completes strictly before the notification is emitted, so any
//! listener running during that emission reads the post-update state.
//!
//! There is no global instance and no import-time side effect; the
//! hosting runtime constructs a node, calls `init()`, hands events to
//! it, and calls `teardown()` when done.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod node;
pub mod telemetry;

// Re-export main types
pub use config::{ConfigError, MirrorConfig};
pub use node::MirrorNode;
pub use telemetry::init_logging;
