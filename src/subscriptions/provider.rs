//! Provider seam for telemetry subscription backends.

use crate::error::Result;
use crate::types::FeedId;
use std::collections::HashSet;

/// Prefix applied to feed IDs when talking to providers. Topic strings are
/// the only wire-level naming this crate knows about.
pub const TELEMETRY_TOPIC_PREFIX: &str = "telemetry:";

/// A telemetry subscription backend.
///
/// Providers are registered with the
/// [`SubscriptionCoordinator`](super::SubscriptionCoordinator) and asked to
/// start or stop delivering feed updates. Calls are expected to be
/// non-blocking registration operations.
pub trait Provider: Send + Sync {
    /// Ask the provider to begin delivering the given topics.
    ///
    /// Returns the subset of `topics` the provider did NOT take on; a
    /// provider accepts a topic by omitting it from the returned set.
    /// Subscribing to an already-delivered topic must be a no-op.
    fn subscribe_topics(&self, topics: &[String]) -> HashSet<String>;

    /// Ask the provider to stop delivering the given topics.
    ///
    /// Unknown topics are a no-op, not an error.
    fn unsubscribe_topics(&self, topics: &[String]) -> Result<()>;

    /// Force re-delivery of current values without changing subscriptions.
    fn refresh(&self);
}

/// The provider-level topic string for a feed.
pub fn feed_topic(feed: &FeedId) -> String {
    format!("{}{}", TELEMETRY_TOPIC_PREFIX, feed)
}

/// Recover the feed ID from a provider topic string.
pub fn topic_feed(topic: &str) -> Option<FeedId> {
    topic.strip_prefix(TELEMETRY_TOPIC_PREFIX).map(FeedId::new)
}
