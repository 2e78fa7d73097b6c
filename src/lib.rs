//! # Feed Cache
//!
//! A partitioned in-memory time-series buffer for telemetry feed samples,
//! paired with a debounced subscription lifecycle manager. Sits between
//! consumers (displays, evaluators) and raw telemetry sources as a caching
//! and flow-control layer.
//!
//! ## Core Concepts
//!
//! - **Feeds**: Named telemetry channels producing timestamped samples
//! - **Partitions**: Bounded-lifetime containers of per-feed sample stores,
//!   rotated over time, with a reclaimable warm tier after rotation
//! - **Coordinator**: Tracks bound providers and feeds awaiting one
//! - **Grace period**: Unsubscribes are debounced, so a display briefly
//!   closed and reopened causes no subscription churn
//!
//! ## Example
//!
//! ```ignore
//! use feedcache::{BufferConfig, FeedId, MemoryBuffer, TimeUnit, value_attributes};
//!
//! let buffer = MemoryBuffer::new(BufferConfig::default());
//!
//! buffer.put_sample(
//!     FeedId::new("pwr.bus.a.voltage"),
//!     1_700_000_000_000,
//!     TimeUnit::Milliseconds,
//!     value_attributes("28.4"),
//! )?;
//!
//! let data = buffer.get_data(
//!     &[FeedId::new("pwr.bus.a.voltage")],
//!     TimeUnit::Milliseconds,
//!     1_700_000_000_000,
//!     1_700_000_060_000,
//! );
//! ```

pub mod buffer;
pub mod error;
pub mod partitions;
pub mod samples;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use buffer::{BufferConfig, MemoryBuffer};
pub use error::{FeedError, Result};
pub use partitions::{Partition, PartitionState};
pub use samples::SampleStore;
pub use subscriptions::{
    feed_topic, topic_feed, CoordinatorConfig, Provider, SubscriptionCoordinator,
    UnsubscriptionScheduler, TELEMETRY_TOPIC_PREFIX,
};
pub use types::{
    value_attributes, Attributes, FeedExtent, FeedId, LevelOfService, Sample, TimeUnit, Timestamp,
    LIMIT_LINE_FEED_PREFIX, STATUS_ATTRIBUTE, VALUE_ATTRIBUTE,
};
