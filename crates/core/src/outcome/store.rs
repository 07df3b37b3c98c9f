use chrono::{DateTime, Utc};
use thiserror::Error;

use super::events::OutcomeRecord;

/// Errors from outcome storage operations
#[derive(Debug, Error)]
pub enum OutcomeError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for querying outcome records
#[derive(Debug, Clone, Default)]
pub struct OutcomeFilter {
    /// Filter by torrent hash
    pub torrent_hash: Option<String>,
    /// Filter by event type (e.g. "torrent_completed")
    pub event_type: Option<String>,
    /// Records at or after this time
    pub from: Option<DateTime<Utc>>,
    /// Records before this time
    pub to: Option<DateTime<Utc>>,
    /// Maximum records to return
    pub limit: i64,
    /// Offset for pagination
    pub offset: i64,
}

impl OutcomeFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            ..Default::default()
        }
    }

    pub fn with_torrent_hash(mut self, hash: impl Into<String>) -> Self {
        self.torrent_hash = Some(hash.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Storage backend for outcome records
pub trait OutcomeStore: Send + Sync {
    /// Insert a record, returning its assigned id
    fn insert(&self, record: &OutcomeRecord) -> Result<i64, OutcomeError>;

    /// Query records matching the filter, newest first
    fn query(&self, filter: &OutcomeFilter) -> Result<Vec<OutcomeRecord>, OutcomeError>;

    /// Count records matching the filter (ignores limit/offset)
    fn count(&self, filter: &OutcomeFilter) -> Result<i64, OutcomeError>;
}
