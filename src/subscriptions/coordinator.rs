//! Subscription coordinator mediating consumers, providers, and the
//! unsubscription scheduler.

use crate::subscriptions::provider::{feed_topic, topic_feed, Provider};
use crate::subscriptions::scheduler::{ExpireFn, UnsubscriptionScheduler};
use crate::types::FeedId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for a coordinator.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Debounce delay between an unsubscribe request and the provider-level
    /// unsubscription.
    pub grace_period: Duration,

    /// How often the background sweeper checks for elapsed grace periods.
    pub sweep_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

/// Mutable coordinator state, guarded by a single lock.
struct CoordinatorState {
    /// Currently bound providers.
    providers: Vec<Arc<dyn Provider>>,

    /// Feeds requested for subscription that no bound provider has accepted.
    pending: HashSet<FeedId>,
}

/// Tracks bound data providers and mediates subscribe/unsubscribe requests
/// against the debounce scheduler.
///
/// Constructed explicitly and passed to callers; there is no process-wide
/// instance. Provider subscribe calls are made under the coordinator lock so
/// the accept decision and the pending-set update are atomic; providers are
/// assumed to be non-blocking registration backends. Sweep-time unsubscribes
/// run on a provider snapshot with no lock held.
pub struct SubscriptionCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    scheduler: UnsubscriptionScheduler,
}

impl SubscriptionCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let state = Arc::new(Mutex::new(CoordinatorState {
            providers: Vec::new(),
            pending: HashSet::new(),
        }));

        let expire_state = Arc::clone(&state);
        let on_expire: ExpireFn = Box::new(move |feed: &FeedId| {
            let providers = expire_state.lock().providers.clone();
            let topic = feed_topic(feed);
            for provider in providers {
                // One provider's failure must not block the others or abort
                // the sweep.
                if let Err(err) = provider.unsubscribe_topics(std::slice::from_ref(&topic)) {
                    warn!(feed = %feed, error = %err, "provider unsubscribe failed during sweep");
                }
            }
        });

        let mut scheduler = UnsubscriptionScheduler::new(config.grace_period, on_expire);
        scheduler.start_sweeper(config.sweep_interval);

        Self { state, scheduler }
    }

    /// Request delivery of the given feeds.
    ///
    /// Feeds with a pending unsubscription are simply de-scheduled — their
    /// provider-level subscription never lapsed. The rest are offered to the
    /// bound providers; feeds no provider accepts wait in the pending set
    /// until one binds. Idempotent: re-subscribing an active feed is a no-op
    /// at the provider.
    pub fn subscribe(&self, feeds: &[FeedId]) {
        let mut remaining = Vec::new();
        for feed in feeds {
            if !self.scheduler.cancel(feed) {
                remaining.push(feed.clone());
            }
        }
        if remaining.is_empty() {
            return;
        }

        let mut state = self.state.lock();
        let unhandled = offer_to_providers(&state.providers, &remaining);
        for feed in unhandled {
            state.pending.insert(feed);
        }
    }

    /// Request that delivery of the given feeds stop.
    ///
    /// Feeds still pending (never reached a provider) are just removed.
    /// Active feeds are handed to the scheduler with a fresh deadline rather
    /// than unsubscribed immediately, so a quick re-subscribe is free.
    /// Unknown feeds are a no-op.
    pub fn unsubscribe(&self, feeds: &[FeedId]) {
        let mut state = self.state.lock();
        for feed in feeds {
            if state.pending.remove(feed) {
                continue;
            }
            self.scheduler.schedule(feed.clone());
        }
    }

    /// Bind a provider and retry all pending feeds against the provider set.
    pub fn add_provider(&self, provider: Arc<dyn Provider>) {
        let mut state = self.state.lock();
        state.providers.push(provider);

        if state.pending.is_empty() {
            return;
        }

        let waiting: Vec<FeedId> = state.pending.iter().cloned().collect();
        let unhandled = offer_to_providers(&state.providers, &waiting);
        debug!(
            retried = waiting.len(),
            still_pending = unhandled.len(),
            "retried pending feeds after provider bind"
        );
        state.pending = unhandled.into_iter().collect();
    }

    /// Drop a provider from the bound set.
    ///
    /// Feeds the provider is actively delivering are not torn down here;
    /// they lapse only when the provider itself goes away.
    pub fn remove_provider(&self, provider: &Arc<dyn Provider>) {
        let mut state = self.state.lock();
        state.providers.retain(|p| !Arc::ptr_eq(p, provider));
    }

    /// Forward a refresh signal to every bound provider.
    pub fn refresh(&self) {
        let providers = self.state.lock().providers.clone();
        for provider in providers {
            provider.refresh();
        }
    }

    /// Run one sweep pass immediately (elapsed grace periods only).
    pub fn sweep_once(&self) {
        self.scheduler.sweep_once();
    }

    /// Feeds awaiting a provider.
    pub fn pending_feeds(&self) -> Vec<FeedId> {
        let mut feeds: Vec<FeedId> = self.state.lock().pending.iter().cloned().collect();
        feeds.sort();
        feeds
    }

    /// Number of bound providers.
    pub fn provider_count(&self) -> usize {
        self.state.lock().providers.len()
    }

    /// Number of feeds in the pending-unsubscribe state.
    pub fn pending_unsubscribe_count(&self) -> usize {
        self.scheduler.pending_count()
    }
}

impl Default for SubscriptionCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

/// Offer `feeds` to each provider in turn; returns the feeds nobody accepted.
fn offer_to_providers(providers: &[Arc<dyn Provider>], feeds: &[FeedId]) -> Vec<FeedId> {
    let mut topics: Vec<String> = feeds.iter().map(feed_topic).collect();

    for provider in providers {
        if topics.is_empty() {
            break;
        }
        let unhandled = provider.subscribe_topics(&topics);
        topics.retain(|topic| unhandled.contains(topic));
    }

    topics.iter().filter_map(|topic| topic_feed(topic)).collect()
}
