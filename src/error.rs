//! Error types for the feed buffer.

use crate::types::FeedId;
use thiserror::Error;

/// Main error type for buffer and subscription operations.
///
/// Queries never fail for "no data" reasons — missing feeds, closed
/// partitions, and reclaimed storage all degrade to empty results. Only
/// capacity exhaustion and provider call failures are caller-visible.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("buffer full for feed {feed}: capacity {capacity} reached")]
    BufferFull { feed: FeedId, capacity: usize },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, FeedError>;
