//! Bounded-lifetime partitions of per-feed sample stores.
//!
//! A partition owns one [`SampleStore`](crate::samples::SampleStore) per feed
//! in two tiers: a strongly-held hot tier while active, and a reclaimable
//! warm tier after `mark_inactive()`. Warm data stays readable until it is
//! explicitly reclaimed under memory pressure; reads then degrade to
//! "no data" rather than failing. Closing a partition releases everything.

mod partition;

pub use partition::{Partition, PartitionState};
