//! Partition implementation.

use crate::error::Result;
use crate::samples::SampleStore;
use crate::types::{Attributes, FeedExtent, FeedId, Sample, TimeUnit, Timestamp};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Lifecycle state of a partition. Transitions are monotonic:
/// `Active -> Inactive -> Closed`, never backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionState {
    /// Accepts writes; storage is strongly held.
    Active,

    /// No longer written; storage may be reclaimed under memory pressure.
    Inactive,

    /// Storage discarded; all reads return empty.
    Closed,
}

/// A bounded-lifetime container of per-feed sample stores.
///
/// Writes and reads racing against rotation are valid: a call against a
/// closed partition is a no-op / returns empty rather than erroring, since
/// components unaware of the rotation may still hold a reference.
pub struct Partition {
    /// Per-feed sample capacity applied to stores created here.
    feed_capacity: Option<usize>,

    state: RwLock<PartitionState>,

    /// Strongly-held stores while the partition is active.
    hot: RwLock<HashMap<FeedId, Arc<SampleStore>>>,

    /// Reclaimable stores after `mark_inactive()`. Reads refresh recency, so
    /// `reclaim` releases the least-recently-read feeds first.
    warm: Mutex<LruCache<FeedId, Arc<SampleStore>>>,
}

impl Partition {
    pub fn new(feed_capacity: Option<usize>) -> Self {
        Self {
            feed_capacity,
            state: RwLock::new(PartitionState::Active),
            hot: RwLock::new(HashMap::new()),
            warm: Mutex::new(LruCache::unbounded()),
        }
    }

    pub fn state(&self) -> PartitionState {
        *self.state.read()
    }

    pub fn is_active(&self) -> bool {
        self.state() == PartitionState::Active
    }

    pub fn is_closed(&self) -> bool {
        self.state() == PartitionState::Closed
    }

    /// Write a batch of samples, normalizing timestamps from `unit`.
    ///
    /// Returns the min/max timestamp actually written per feed in this call
    /// (not cumulative). On a non-active partition this is a no-op returning
    /// an empty map. A capacity failure aborts the call; samples already
    /// written in the same call remain.
    pub fn put_data(
        &self,
        values: HashMap<FeedId, BTreeMap<i64, Attributes>>,
        unit: TimeUnit,
    ) -> Result<HashMap<FeedId, FeedExtent>> {
        if !self.is_active() {
            return Ok(HashMap::new());
        }

        let mut extents = HashMap::new();

        for (feed, records) in values {
            if records.is_empty() {
                continue;
            }

            let store = self.hot_store(&feed);
            let mut extent: Option<FeedExtent> = None;

            for (raw_ts, attributes) in records {
                let ts = Timestamp::from_unit(raw_ts, unit);
                store.put(ts, attributes)?;

                match extent.as_mut() {
                    Some(e) => e.include(ts),
                    None => extent = Some(FeedExtent::single(ts)),
                }
            }

            if let Some(extent) = extent {
                extents.insert(feed, extent);
            }
        }

        Ok(extents)
    }

    /// Write a single sample, returning its extent.
    pub fn put_sample(
        &self,
        feed: FeedId,
        timestamp: i64,
        unit: TimeUnit,
        attributes: Attributes,
    ) -> Result<Option<FeedExtent>> {
        let mut records = BTreeMap::new();
        records.insert(timestamp, attributes);

        let mut values = HashMap::new();
        values.insert(feed.clone(), records);

        Ok(self.put_data(values, unit)?.remove(&feed))
    }

    /// Range query across the given feeds.
    ///
    /// Feeds with no store, no data in range, or whose storage has been
    /// reclaimed are absent from the result — absence means "no data".
    pub fn get_data(
        &self,
        feeds: &[FeedId],
        unit: TimeUnit,
        start: i64,
        end: i64,
    ) -> HashMap<FeedId, Vec<Sample>> {
        let start = Timestamp::from_unit(start, unit);
        let end = Timestamp::from_unit(end, unit);

        let mut result = HashMap::new();
        for feed in feeds {
            if let Some(store) = self.lookup_store(feed) {
                let samples = store.range_query(start, end);
                if !samples.is_empty() {
                    result.insert(feed.clone(), samples);
                }
            }
        }
        result
    }

    /// Latest-in-range query across the given feeds.
    pub fn get_last_data(
        &self,
        feeds: &[FeedId],
        unit: TimeUnit,
        start: i64,
        end: i64,
    ) -> HashMap<FeedId, Sample> {
        let start = Timestamp::from_unit(start, unit);
        let end = Timestamp::from_unit(end, unit);

        let mut result = HashMap::new();
        for feed in feeds {
            if let Some(store) = self.lookup_store(feed) {
                if let Some(sample) = store.latest_in_range(start, end) {
                    result.insert(feed.clone(), sample);
                }
            }
        }
        result
    }

    /// Transition active -> inactive, demoting all stores to the warm tier.
    ///
    /// No-op in any other state.
    pub fn mark_inactive(&self) {
        let mut state = self.state.write();
        if *state != PartitionState::Active {
            return;
        }
        *state = PartitionState::Inactive;

        let mut hot = self.hot.write();
        let mut warm = self.warm.lock();
        for (feed, store) in hot.drain() {
            warm.put(feed, store);
        }
    }

    /// Transition to closed and discard all owned data unconditionally.
    pub fn close(&self) {
        let mut state = self.state.write();
        *state = PartitionState::Closed;

        self.hot.write().clear();
        self.warm.lock().clear();
    }

    /// Release up to `count` least-recently-read warm feed stores.
    ///
    /// Models memory pressure deterministically; returns how many stores
    /// were released.
    pub fn reclaim(&self, count: usize) -> usize {
        let mut warm = self.warm.lock();
        let mut released = 0;
        while released < count && warm.pop_lru().is_some() {
            released += 1;
        }
        released
    }

    /// Release the entire warm tier.
    pub fn reclaim_all(&self) -> usize {
        let mut warm = self.warm.lock();
        let released = warm.len();
        warm.clear();
        released
    }

    /// Number of feeds with a store in either tier.
    pub fn feed_count(&self) -> usize {
        self.hot.read().len() + self.warm.lock().len()
    }

    /// Get or create the hot-tier store for `feed`.
    fn hot_store(&self, feed: &FeedId) -> Arc<SampleStore> {
        if let Some(store) = self.hot.read().get(feed) {
            return Arc::clone(store);
        }

        let mut hot = self.hot.write();
        Arc::clone(
            hot.entry(feed.clone())
                .or_insert_with(|| Arc::new(SampleStore::new(feed.clone(), self.feed_capacity))),
        )
    }

    /// Find `feed`'s store in the hot tier, then the warm tier.
    fn lookup_store(&self, feed: &FeedId) -> Option<Arc<SampleStore>> {
        if let Some(store) = self.hot.read().get(feed) {
            return Some(Arc::clone(store));
        }
        self.warm.lock().get(feed).map(Arc::clone)
    }
}
