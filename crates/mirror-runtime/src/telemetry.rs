//! Logging setup.
//!
//! Structured `tracing` output with an environment-overridable filter.
//! `RUST_LOG` wins when set; otherwise the level defaults from
//! `enable_debug_logging`.

use crate::config::MirrorConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Returns false when a subscriber was already installed (tests install
/// their own); that is not an error.
pub fn init_logging(config: &MirrorConfig) -> bool {
    let default_level = if config.enable_debug_logging {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
