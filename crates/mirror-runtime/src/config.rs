//! Mirror node configuration.
//!
//! `validate()` is the single place that may fail synchronously during
//! setup; every later failure is surfaced through emitted events.

use mirror_link::LinkConfig;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric option that must be positive was zero.
    #[error("`{option}` must be greater than zero")]
    ZeroOption {
        /// Name of the offending option.
        option: &'static str,
    },

    /// Persistence was enabled without a usable key.
    #[error("`persistence_key` must be non-empty when persistence is enabled")]
    EmptyPersistenceKey,
}

/// All recognized mirror options.
#[derive(Clone, Debug)]
pub struct MirrorConfig {
    /// Maximum live cache entries.
    pub capacity: usize,
    /// Default entry lifetime in milliseconds.
    pub ttl_ms: u64,
    /// Whether to load/save a cache snapshot at init/teardown.
    pub enable_persistence: bool,
    /// Key naming the snapshot target; distinct keys never clobber
    /// each other.
    pub persistence_key: String,
    /// Period of the background expiry sweep, in milliseconds.
    pub cleanup_interval_ms: u64,
    /// Maximum reconnect attempts per outage.
    pub reconnect_attempts: u32,
    /// Backoff base delay in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Heartbeat probe interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Default the log filter to debug instead of info.
    pub enable_debug_logging: bool,
    /// Soft cap on listeners per event kind.
    pub max_listeners: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            capacity: mirror_cache::DEFAULT_CAPACITY,
            ttl_ms: mirror_cache::DEFAULT_TTL_MS,
            enable_persistence: false,
            persistence_key: "agent-mirror".to_string(),
            cleanup_interval_ms: 60_000,
            reconnect_attempts: 5,
            reconnect_delay_ms: 1_000,
            heartbeat_interval_ms: 30_000,
            enable_debug_logging: false,
            max_listeners: mirror_bus::DEFAULT_MAX_LISTENERS,
        }
    }
}

impl MirrorConfig {
    /// Check the configuration for malformed values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroOption { option: "capacity" });
        }
        if self.ttl_ms == 0 {
            return Err(ConfigError::ZeroOption { option: "ttl_ms" });
        }
        if self.cleanup_interval_ms == 0 {
            return Err(ConfigError::ZeroOption {
                option: "cleanup_interval_ms",
            });
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::ZeroOption {
                option: "reconnect_delay_ms",
            });
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ZeroOption {
                option: "heartbeat_interval_ms",
            });
        }
        if self.max_listeners == 0 {
            return Err(ConfigError::ZeroOption {
                option: "max_listeners",
            });
        }
        if self.enable_persistence && self.persistence_key.trim().is_empty() {
            return Err(ConfigError::EmptyPersistenceKey);
        }
        Ok(())
    }

    /// The connection-manager slice of this configuration.
    #[must_use]
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            reconnect_attempts: self.reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
        }
    }

    /// Period of the background expiry sweep.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}
