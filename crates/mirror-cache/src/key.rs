//! Composite cache keys.
//!
//! Entries are keyed by `category:id`, one namespace per mirrored record
//! family. The string form is what the snapshot format stores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record family a cache entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Agent records.
    Agent,
    /// Channel records.
    Channel,
    /// Message records.
    Message,
    /// Service listings.
    Listing,
    /// Work orders.
    Order,
}

impl Category {
    /// All categories, in a stable order (used for per-category stats).
    pub const ALL: [Self; 5] = [
        Self::Agent,
        Self::Channel,
        Self::Message,
        Self::Listing,
        Self::Order,
    ];

    /// Stable string prefix used in composite keys and snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Channel => "channel",
            Self::Message => "message",
            Self::Listing => "listing",
            Self::Order => "order",
        }
    }

    /// Parse a category prefix.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(Self::Agent),
            "channel" => Some(Self::Channel),
            "message" => Some(Self::Message),
            "listing" => Some(Self::Listing),
            "order" => Some(Self::Order),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite cache key: one record family plus the record's identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    /// Record family namespace.
    pub category: Category,
    /// Record identity within the family.
    pub id: String,
}

impl CompositeKey {
    /// Create a composite key.
    #[must_use]
    pub fn new(category: Category, id: impl Into<String>) -> Self {
        Self {
            category,
            id: id.into(),
        }
    }

    /// Parse the `category:id` string form.
    ///
    /// Ids may themselves contain `:`; only the first separator splits.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (prefix, id) = s.split_once(':')?;
        if id.is_empty() {
            return None;
        }
        Some(Self::new(Category::parse(prefix)?, id))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}
