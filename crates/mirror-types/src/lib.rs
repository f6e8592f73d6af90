//! # Mirror Types Crate
//!
//! This crate contains the domain records mirrored from the upstream
//! protocol, the typed event catalogue that flows through the mirror bus,
//! and the time-source abstraction shared by every other crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Opaque Payloads**: Records are plain data; no crate other than the
//!   coordinator interprets their contents.
//! - **Non-Owning References**: `MessageRecord::channel_id` and the
//!   `WorkOrder` references are foreign keys, never ownership. Removing a
//!   channel does not cascade to its messages.

pub mod events;
pub mod records;
pub mod time;

pub use events::{EventKind, MirrorEvent, RecordPayload};
pub use records::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, Timestamp};
