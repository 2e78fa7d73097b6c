//! Memory buffer façade tying partitions behind the read/write API.

use crate::error::Result;
use crate::partitions::Partition;
use crate::types::{Attributes, FeedExtent, FeedId, LevelOfService, Sample, TimeUnit, Timestamp};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

/// Buffer configuration.
#[derive(Clone, Debug)]
pub struct BufferConfig {
    /// Per-feed sample capacity within one partition. `None` = unbounded.
    pub feed_capacity: Option<usize>,

    /// How many rotated-out partitions to retain in the warm tier before the
    /// oldest is closed.
    pub max_inactive_partitions: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            feed_capacity: None,
            max_inactive_partitions: 2,
        }
    }
}

/// The in-memory telemetry buffer.
///
/// Writes land in the active partition; reads merge the active partition
/// with retained inactive ones, newest first. Rotation *policy* (when to
/// rotate) belongs to the caller; this type only provides the mechanism.
pub struct MemoryBuffer {
    config: BufferConfig,

    /// Newest first; the front partition is the active one.
    partitions: RwLock<VecDeque<Arc<Partition>>>,
}

impl MemoryBuffer {
    pub fn new(config: BufferConfig) -> Self {
        let mut partitions = VecDeque::new();
        partitions.push_front(Arc::new(Partition::new(config.feed_capacity)));

        Self {
            config,
            partitions: RwLock::new(partitions),
        }
    }

    /// The latency class this source advertises to callers.
    pub fn level_of_service(&self) -> LevelOfService {
        LevelOfService::Fast
    }

    /// The partition currently accepting writes.
    pub fn active_partition(&self) -> Arc<Partition> {
        let partitions = self.partitions.read();
        Arc::clone(partitions.front().expect("buffer always has a partition"))
    }

    /// Number of partitions currently held (active + retained inactive).
    pub fn partition_count(&self) -> usize {
        self.partitions.read().len()
    }

    /// Start a fresh active partition.
    ///
    /// The previous active partition is demoted to the reclaimable warm
    /// tier; beyond `max_inactive_partitions`, the oldest is closed and
    /// dropped.
    pub fn rotate(&self) {
        let mut partitions = self.partitions.write();

        if let Some(active) = partitions.front() {
            active.mark_inactive();
        }
        partitions.push_front(Arc::new(Partition::new(self.config.feed_capacity)));

        while partitions.len() > self.config.max_inactive_partitions + 1 {
            if let Some(oldest) = partitions.pop_back() {
                oldest.close();
            }
        }
    }

    // --- Write API ---

    /// Bulk write into the active partition.
    ///
    /// Returns the per-feed min/max timestamp written by this call, for the
    /// caller's metadata index.
    pub fn put_data(
        &self,
        values: HashMap<FeedId, BTreeMap<i64, Attributes>>,
        unit: TimeUnit,
    ) -> Result<HashMap<FeedId, FeedExtent>> {
        self.active_partition().put_data(values, unit)
    }

    /// Single-sample convenience write.
    ///
    /// Returns `None` only if the write raced a partition close.
    pub fn put_sample(
        &self,
        feed: FeedId,
        timestamp: i64,
        unit: TimeUnit,
        attributes: Attributes,
    ) -> Result<Option<FeedExtent>> {
        self.active_partition()
            .put_sample(feed, timestamp, unit, attributes)
    }

    // --- Read API ---

    /// Range query merged across all held partitions.
    ///
    /// Newest partition wins at duplicate timestamps. Unknown feeds are
    /// omitted, never an error.
    pub fn get_data(
        &self,
        feeds: &[FeedId],
        unit: TimeUnit,
        start: i64,
        end: i64,
    ) -> HashMap<FeedId, Vec<Sample>> {
        let partitions: Vec<Arc<Partition>> =
            self.partitions.read().iter().map(Arc::clone).collect();

        let mut merged: HashMap<FeedId, BTreeMap<Timestamp, Sample>> = HashMap::new();
        for partition in &partitions {
            for (feed, samples) in partition.get_data(feeds, unit, start, end) {
                let by_ts = merged.entry(feed).or_default();
                for sample in samples {
                    // Entries from newer partitions are already in place
                    by_ts.entry(sample.timestamp).or_insert(sample);
                }
            }
        }

        merged
            .into_iter()
            .map(|(feed, by_ts)| (feed, by_ts.into_values().collect()))
            .collect()
    }

    /// Latest-in-range query merged across all held partitions.
    pub fn get_last_data(
        &self,
        feeds: &[FeedId],
        unit: TimeUnit,
        start: i64,
        end: i64,
    ) -> HashMap<FeedId, Sample> {
        let partitions: Vec<Arc<Partition>> =
            self.partitions.read().iter().map(Arc::clone).collect();

        let mut result: HashMap<FeedId, Sample> = HashMap::new();
        for partition in &partitions {
            for (feed, sample) in partition.get_last_data(feeds, unit, start, end) {
                match result.get(&feed) {
                    // Newest partition wins at equal timestamps
                    Some(existing) if existing.timestamp >= sample.timestamp => {}
                    _ => {
                        result.insert(feed, sample);
                    }
                }
            }
        }
        result
    }
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}
