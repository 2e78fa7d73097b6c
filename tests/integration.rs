//! Integration tests for the subscription lifecycle and buffer data flow.

use feedcache::{
    value_attributes, BufferConfig, CoordinatorConfig, FeedId, MemoryBuffer, Provider,
    SubscriptionCoordinator, TimeUnit,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Provider that accepts every topic and counts calls.
#[derive(Default)]
struct MockProvider {
    subscribes: Mutex<Vec<String>>,
    unsubscribes: Mutex<Vec<String>>,
    refreshes: AtomicUsize,
}

impl MockProvider {
    fn subscribe_count(&self) -> usize {
        self.subscribes.lock().len()
    }

    fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.lock().len()
    }
}

impl Provider for MockProvider {
    fn subscribe_topics(&self, topics: &[String]) -> HashSet<String> {
        self.subscribes.lock().extend(topics.iter().cloned());
        HashSet::new()
    }

    fn unsubscribe_topics(&self, topics: &[String]) -> feedcache::Result<()> {
        self.unsubscribes.lock().extend(topics.iter().cloned());
        Ok(())
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

fn coordinator(grace: Duration, sweep: Duration) -> SubscriptionCoordinator {
    SubscriptionCoordinator::new(CoordinatorConfig {
        grace_period: grace,
        sweep_interval: sweep,
    })
}

// --- Debounce Behavior ---

#[test]
fn test_debounce_idempotence() {
    // Manual sweeping keeps the timing deterministic
    let coordinator = coordinator(Duration::from_secs(60), Duration::from_secs(3600));
    let provider = Arc::new(MockProvider::default());
    coordinator.add_provider(provider.clone());

    let feed = FeedId::new("X");
    coordinator.subscribe(std::slice::from_ref(&feed));
    coordinator.unsubscribe(std::slice::from_ref(&feed));
    coordinator.subscribe(std::slice::from_ref(&feed));
    coordinator.sweep_once();

    assert_eq!(provider.subscribe_count(), 1);
    assert_eq!(provider.unsubscribe_count(), 0);
}

#[test]
fn test_grace_expiry_exactly_once() {
    let coordinator = coordinator(Duration::from_millis(10), Duration::from_secs(3600));
    let provider = Arc::new(MockProvider::default());
    coordinator.add_provider(provider.clone());

    let feed = FeedId::new("X");
    coordinator.subscribe(std::slice::from_ref(&feed));
    coordinator.unsubscribe(std::slice::from_ref(&feed));

    std::thread::sleep(Duration::from_millis(50));
    coordinator.sweep_once();
    coordinator.sweep_once();

    assert_eq!(provider.unsubscribe_count(), 1);
}

#[test]
fn test_pending_feed_retry_on_bind() {
    let coordinator = coordinator(Duration::from_secs(60), Duration::from_secs(3600));

    let feed = FeedId::new("X");
    coordinator.subscribe(std::slice::from_ref(&feed));
    assert_eq!(coordinator.pending_feeds(), vec![feed.clone()]);

    let provider = Arc::new(MockProvider::default());
    coordinator.add_provider(provider.clone());

    assert!(coordinator.pending_feeds().is_empty());
    assert_eq!(provider.subscribe_count(), 1);
}

#[test]
fn test_unsubscribe_unknown_feed_is_noop() {
    let coordinator = coordinator(Duration::from_secs(60), Duration::from_secs(3600));
    let provider = Arc::new(MockProvider::default());
    coordinator.add_provider(provider.clone());

    // UI teardown paths may unsubscribe twice; neither call may error
    coordinator.unsubscribe(&[FeedId::new("never-subscribed")]);
    coordinator.unsubscribe(&[FeedId::new("never-subscribed")]);

    assert_eq!(coordinator.pending_unsubscribe_count(), 1);
}

// --- End-to-End Scenario ---

#[test]
fn test_subscription_lifecycle_end_to_end() {
    // Background sweeper does the expiring here; generous grace period so
    // the intermediate steps cannot race it.
    let grace = Duration::from_millis(150);
    let coordinator = coordinator(grace, Duration::from_millis(10));
    let provider = Arc::new(MockProvider::default());
    coordinator.add_provider(provider.clone());

    let feed = FeedId::new("X");

    // Consumer opens a display
    coordinator.subscribe(std::slice::from_ref(&feed));
    assert_eq!(provider.subscribe_count(), 1);

    // Display closes: no immediate provider call
    coordinator.unsubscribe(std::slice::from_ref(&feed));
    assert_eq!(provider.unsubscribe_count(), 0);

    // Display reopens within the grace period: pending unsubscribe is
    // cancelled, provider sees no new call
    std::thread::sleep(Duration::from_millis(25));
    coordinator.subscribe(std::slice::from_ref(&feed));
    assert_eq!(provider.subscribe_count(), 1);
    assert_eq!(coordinator.pending_unsubscribe_count(), 0);

    // Display closes for good
    std::thread::sleep(Duration::from_millis(25));
    coordinator.unsubscribe(std::slice::from_ref(&feed));

    // After the grace period the sweeper releases the feed, exactly once
    std::thread::sleep(grace + Duration::from_millis(200));
    assert_eq!(provider.subscribe_count(), 1);
    assert_eq!(provider.unsubscribe_count(), 1);
    assert_eq!(coordinator.pending_unsubscribe_count(), 0);
}

// --- Data Flow ---

#[test]
fn test_subscribed_feed_data_flow() {
    let coordinator = coordinator(Duration::from_secs(60), Duration::from_secs(3600));
    let provider = Arc::new(MockProvider::default());
    coordinator.add_provider(provider.clone());

    let feed = FeedId::new("pwr.bus.a.voltage");
    coordinator.subscribe(std::slice::from_ref(&feed));
    assert_eq!(
        *provider.subscribes.lock(),
        vec!["telemetry:pwr.bus.a.voltage".to_string()]
    );

    // The provider begins delivering samples into the buffer
    let buffer = MemoryBuffer::new(BufferConfig::default());
    for (ts, value) in [(1_000, "28.1"), (2_000, "28.4"), (3_000, "28.2")] {
        buffer
            .put_sample(
                feed.clone(),
                ts,
                TimeUnit::Milliseconds,
                value_attributes(value),
            )
            .unwrap();
    }

    // A display queries the buffer
    let data = buffer.get_data(
        std::slice::from_ref(&feed),
        TimeUnit::Milliseconds,
        0,
        10_000,
    );
    let values: Vec<&str> = data[&feed].iter().filter_map(|s| s.value()).collect();
    assert_eq!(values, vec!["28.1", "28.4", "28.2"]);

    // Refresh fans out to the provider without changing subscriptions
    coordinator.refresh();
    assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(provider.subscribe_count(), 1);
}

#[test]
fn test_rotation_with_live_queries() {
    let buffer = MemoryBuffer::new(BufferConfig {
        feed_capacity: None,
        max_inactive_partitions: 1,
    });
    let feed = FeedId::new("therm.sensor.3");

    buffer
        .put_sample(
            feed.clone(),
            1_000,
            TimeUnit::Milliseconds,
            value_attributes("291.5"),
        )
        .unwrap();

    // Holding a reference across rotation must never error
    let stale = buffer.active_partition();
    buffer.rotate();
    buffer.rotate();

    // stale partition is now closed; all its operations degrade
    assert!(stale.is_closed());
    assert!(stale
        .get_data(std::slice::from_ref(&feed), TimeUnit::Milliseconds, 0, 10_000)
        .is_empty());
    let extents = stale
        .put_sample(
            feed.clone(),
            2_000,
            TimeUnit::Milliseconds,
            value_attributes("292.0"),
        )
        .unwrap();
    assert!(extents.is_none());
}
