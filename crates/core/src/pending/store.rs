use thiserror::Error;

use super::types::{
    AuditContext, NewPendingTorrent, PendingTorrent, TorrentStatus, TransitionFields,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("torrent already registered: {0}")]
    Duplicate(String),

    #[error("status conflict for {hash}: expected {expected}, found {actual}")]
    Conflict {
        hash: String,
        expected: TorrentStatus,
        actual: TorrentStatus,
    },

    #[error("pending torrent not found: {0}")]
    NotFound(String),

    #[error("transition from {from} to {to} is not allowed")]
    InvalidTransition {
        from: TorrentStatus,
        to: TorrentStatus,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable store of pending torrents, keyed by info-hash.
///
/// Status changes are compare-and-swap: the caller states the status it
/// read, and the write applies only while that status still holds, so two
/// workers can never double-apply a transition.
pub trait PendingTorrentStore: Send + Sync {
    /// Insert a new record in `WaitingMetadata` with a zero retry count.
    /// The hash is the dedup key: re-registering an existing hash returns
    /// [`StoreError::Duplicate`] and leaves the stored record untouched.
    fn create(
        &self,
        request: NewPendingTorrent,
        ctx: &AuditContext,
    ) -> Result<PendingTorrent, StoreError>;

    fn get(&self, torrent_hash: &str) -> Result<Option<PendingTorrent>, StoreError>;

    /// Consistent snapshot of all records currently in `status`.
    fn list_by_status(&self, status: TorrentStatus) -> Result<Vec<PendingTorrent>, StoreError>;

    fn count_by_status(&self, status: TorrentStatus) -> Result<i64, StoreError>;

    /// Compare-and-swap status change, atomically writing `fields` with the
    /// new status. [`StoreError::Conflict`] when the record is no longer in
    /// `expected`, [`StoreError::InvalidTransition`] when the edge itself is
    /// illegal. Stamps `last_check_at` and the audit columns.
    fn transition(
        &self,
        torrent_hash: &str,
        expected: TorrentStatus,
        new_status: TorrentStatus,
        fields: TransitionFields,
        ctx: &AuditContext,
    ) -> Result<PendingTorrent, StoreError>;

    /// Atomically add one to the retry counter, stamping `last_check_at`.
    /// Returns the new counter value.
    fn increment_retry(&self, torrent_hash: &str, ctx: &AuditContext) -> Result<u32, StoreError>;
}
