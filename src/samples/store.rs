//! Sample store implementation.

use crate::error::{FeedError, Result};
use crate::types::{Attributes, FeedExtent, FeedId, Sample, Timestamp};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Ordered collection of timestamped attribute records for one feed.
///
/// Mutation is serialized by the store's lock, so concurrent writers to the
/// same feed cannot corrupt the sorted structure; the result of interleaved
/// writes is the union of all writes with last-write-wins at exact-duplicate
/// timestamps.
pub struct SampleStore {
    /// Which feed this store belongs to (for error reporting).
    feed: FeedId,

    /// Max stored samples, if bounded.
    capacity: Option<usize>,

    /// Samples keyed by normalized timestamp.
    samples: RwLock<BTreeMap<Timestamp, Attributes>>,
}

impl SampleStore {
    /// Create a store for `feed`, optionally bounded to `capacity` samples.
    pub fn new(feed: FeedId, capacity: Option<usize>) -> Self {
        Self {
            feed,
            capacity,
            samples: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or overwrite the record at `timestamp`.
    ///
    /// Overwrites never fail; inserting a new timestamp into a store already
    /// at capacity returns [`FeedError::BufferFull`].
    pub fn put(&self, timestamp: Timestamp, attributes: Attributes) -> Result<()> {
        let mut samples = self.samples.write();

        if let Some(capacity) = self.capacity {
            if samples.len() >= capacity && !samples.contains_key(&timestamp) {
                return Err(FeedError::BufferFull {
                    feed: self.feed.clone(),
                    capacity,
                });
            }
        }

        samples.insert(timestamp, attributes);
        Ok(())
    }

    /// All samples with `start <= timestamp <= end`, ascending.
    ///
    /// An empty or inverted range yields an empty vec, never an error.
    pub fn range_query(&self, start: Timestamp, end: Timestamp) -> Vec<Sample> {
        if start > end {
            return Vec::new();
        }

        self.samples
            .read()
            .range(start..=end)
            .map(|(ts, attributes)| Sample {
                timestamp: *ts,
                attributes: attributes.clone(),
            })
            .collect()
    }

    /// The single sample with the greatest timestamp in `[start, end]`.
    pub fn latest_in_range(&self, start: Timestamp, end: Timestamp) -> Option<Sample> {
        if start > end {
            return None;
        }

        self.samples
            .read()
            .range(start..=end)
            .next_back()
            .map(|(ts, attributes)| Sample {
                timestamp: *ts,
                attributes: attributes.clone(),
            })
    }

    /// Cumulative min/max timestamp currently stored.
    pub fn extent(&self) -> Option<FeedExtent> {
        let samples = self.samples.read();
        let min = *samples.keys().next()?;
        let max = *samples.keys().next_back()?;
        Some(FeedExtent { min, max })
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }
}
