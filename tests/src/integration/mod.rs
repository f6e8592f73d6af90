//! Cross-crate choreography tests.

pub mod bus_delivery;
pub mod cache_lifecycle;
pub mod link_recovery;
