//! Core types for the feed buffer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute key under which every sample carries its normalized value.
pub const VALUE_ATTRIBUTE: &str = "value";

/// Attribute key for optional status/rendering metadata.
pub const STATUS_ATTRIBUTE: &str = "status";

/// Prefix reserved for limit-line pseudo-feeds. The remainder of the ID is
/// the component identifier the limit line belongs to.
pub const LIMIT_LINE_FEED_PREFIX: &str = "limit-line:";

/// Opaque identifier for a telemetry feed.
///
/// Feed IDs are map keys, never parsed — except for the reserved
/// [`LIMIT_LINE_FEED_PREFIX`] convention used by synthetic feeds.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedId(pub String);

impl FeedId {
    pub fn new(id: impl Into<String>) -> Self {
        FeedId(id.into())
    }

    /// Build the pseudo-feed ID for a component's limit line.
    pub fn limit_line(component_id: &str) -> Self {
        FeedId(format!("{}{}", LIMIT_LINE_FEED_PREFIX, component_id))
    }

    /// The component identifier, if this is a limit-line pseudo-feed.
    pub fn limit_line_component(&self) -> Option<&str> {
        self.0.strip_prefix(LIMIT_LINE_FEED_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self.0)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeedId {
    fn from(s: &str) -> Self {
        FeedId(s.to_string())
    }
}

/// Time unit tag accompanying every timestamp argument at the API boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

/// Milliseconds since Unix epoch — the single internal unit all stored
/// timestamps are normalized to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Normalize a caller timestamp to the internal unit.
    ///
    /// Sub-millisecond precision truncates toward zero.
    pub fn from_unit(value: i64, unit: TimeUnit) -> Self {
        let millis = match unit {
            TimeUnit::Seconds => value.saturating_mul(1_000),
            TimeUnit::Milliseconds => value,
            TimeUnit::Microseconds => value / 1_000,
            TimeUnit::Nanoseconds => value / 1_000_000,
        };
        Timestamp(millis)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Attribute map carried by a sample. Keys are stored in sorted order.
pub type Attributes = BTreeMap<String, String>;

/// One timestamped data point for a feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// When the sample was taken (internal unit).
    pub timestamp: Timestamp,

    /// Key/value attributes. Always carries at least [`VALUE_ATTRIBUTE`].
    pub attributes: Attributes,
}

impl Sample {
    pub fn new(timestamp: Timestamp, attributes: Attributes) -> Self {
        debug_assert!(
            attributes.contains_key(VALUE_ATTRIBUTE),
            "sample missing {} attribute",
            VALUE_ATTRIBUTE
        );
        Self {
            timestamp,
            attributes,
        }
    }

    /// The normalized value attribute.
    pub fn value(&self) -> Option<&str> {
        self.attributes.get(VALUE_ATTRIBUTE).map(String::as_str)
    }

    /// The status attribute, if any.
    pub fn status(&self) -> Option<&str> {
        self.attributes.get(STATUS_ATTRIBUTE).map(String::as_str)
    }
}

/// Min/max timestamp written for a feed in a single `put_data` call.
///
/// Consumed by the external metadata index to decide which partitions can
/// satisfy future range queries. Not cumulative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedExtent {
    pub min: Timestamp,
    pub max: Timestamp,
}

impl FeedExtent {
    /// Extent covering a single timestamp.
    pub fn single(ts: Timestamp) -> Self {
        Self { min: ts, max: ts }
    }

    /// Widen the extent to include `ts`.
    pub fn include(&mut self, ts: Timestamp) {
        if ts < self.min {
            self.min = ts;
        }
        if ts > self.max {
            self.max = ts;
        }
    }
}

/// Coarse latency class a data source advertises to its callers.
///
/// Callers use this to prioritize which source to query first when several
/// can satisfy a request (memory buffer = fast, disk = medium, archive = slow).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOfService {
    Fast,
    Medium,
    Slow,
}

/// Build the attribute map for a plain value sample.
pub fn value_attributes(value: impl Into<String>) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(VALUE_ATTRIBUTE.to_string(), value.into());
    attributes
}
