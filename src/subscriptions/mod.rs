//! Subscription lifecycle management.
//!
//! Governs when upstream providers are told to start or stop delivering a
//! feed's updates:
//! - The [`SubscriptionCoordinator`] tracks bound providers and feeds still
//!   awaiting one.
//! - The [`UnsubscriptionScheduler`] debounces unsubscribes: a feed is only
//!   released at the provider after a grace period, so a display briefly
//!   closed and reopened costs nothing.
//!
//! # Example
//!
//! ```ignore
//! let coordinator = SubscriptionCoordinator::new(CoordinatorConfig {
//!     grace_period: Duration::from_secs(5),
//!     sweep_interval: Duration::from_secs(1),
//! });
//! coordinator.add_provider(provider);
//!
//! coordinator.subscribe(&[FeedId::new("pwr.bus.a.voltage")]);
//! // ... consumer closes its display ...
//! coordinator.unsubscribe(&[FeedId::new("pwr.bus.a.voltage")]);
//! // re-opening within the grace period cancels the pending unsubscribe
//! coordinator.subscribe(&[FeedId::new("pwr.bus.a.voltage")]);
//! ```

mod coordinator;
mod provider;
mod scheduler;

pub use coordinator::{CoordinatorConfig, SubscriptionCoordinator};
pub use provider::{feed_topic, topic_feed, Provider, TELEMETRY_TOPIC_PREFIX};
pub use scheduler::{ExpireFn, UnsubscriptionScheduler};
