use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filter::FilterResult;

/// Lifecycle status of a pending torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    /// Registered, waiting for the client to resolve the file list.
    WaitingMetadata,
    /// File list available, not yet filtered.
    MetadataReady,
    /// Filter evaluation in progress.
    Filtering,
    /// Filter passed; `filter_result` is persisted.
    Completed,
    /// Hard client error or filter rejection; `error_message` is set.
    Failed,
    /// Retry budget exhausted before metadata became available.
    TimedOut,
}

impl TorrentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentStatus::WaitingMetadata => "waiting_metadata",
            TorrentStatus::MetadataReady => "metadata_ready",
            TorrentStatus::Filtering => "filtering",
            TorrentStatus::Completed => "completed",
            TorrentStatus::Failed => "failed",
            TorrentStatus::TimedOut => "timed_out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting_metadata" => Some(TorrentStatus::WaitingMetadata),
            "metadata_ready" => Some(TorrentStatus::MetadataReady),
            "filtering" => Some(TorrentStatus::Filtering),
            "completed" => Some(TorrentStatus::Completed),
            "failed" => Some(TorrentStatus::Failed),
            "timed_out" => Some(TorrentStatus::TimedOut),
            _ => None,
        }
    }

    /// Terminal records are never polled or written again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TorrentStatus::Completed | TorrentStatus::Failed | TorrentStatus::TimedOut
        )
    }

    /// Legal forward edges. Failure and timeout are reachable from any
    /// non-terminal status; terminal statuses have no outgoing edges.
    pub fn can_transition_to(&self, next: TorrentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            TorrentStatus::Failed | TorrentStatus::TimedOut => true,
            TorrentStatus::MetadataReady => *self == TorrentStatus::WaitingMetadata,
            TorrentStatus::Filtering => *self == TorrentStatus::MetadataReady,
            TorrentStatus::Completed => *self == TorrentStatus::Filtering,
            TorrentStatus::WaitingMetadata => false,
        }
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the actor behind a write and correlates the writes of one
/// logical operation. Built at each entrypoint and passed down explicitly;
/// there is no ambient audit state.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub actor: String,
    pub correlation_id: Uuid,
}

impl AuditContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            correlation_id: Uuid::new_v4(),
        }
    }
}

/// A torrent handed to the download client and tracked until filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTorrent {
    /// Info-hash, the unique dedup key. Immutable.
    pub torrent_hash: String,
    pub magnet_link: String,
    pub save_path: String,
    pub category: Option<String>,
    /// Opaque catalog identifier of the video this torrent was matched to.
    pub video_number: Option<String>,
    /// Which intake path registered the torrent.
    pub source_tag: String,
    pub status: TorrentStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Set exactly once, on the transition into `Completed`.
    pub filter_result: Option<FilterResult>,
    /// Set on `Failed` and `TimedOut` only.
    pub error_message: Option<String>,
    pub added_at: DateTime<Utc>,
    pub last_check_at: Option<DateTime<Utc>>,
    /// Set once, on any terminal transition.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of files the client reported when metadata became ready.
    pub file_count: Option<u32>,
    pub total_size_bytes: Option<u64>,
    /// Number of files surviving the filter.
    pub filtered_file_count: Option<u32>,
    pub created_by: String,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Request to register a torrent for tracking.
#[derive(Debug, Clone)]
pub struct NewPendingTorrent {
    pub torrent_hash: String,
    pub magnet_link: String,
    pub save_path: String,
    pub category: Option<String>,
    pub video_number: Option<String>,
    pub source_tag: String,
    pub max_retries: u32,
}

/// Columns written together with a status change. Absent fields keep their
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub file_count: Option<u32>,
    pub total_size_bytes: Option<u64>,
    pub filtered_file_count: Option<u32>,
    pub filter_result: Option<FilterResult>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransitionFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_count(mut self, count: u32) -> Self {
        self.file_count = Some(count);
        self
    }

    pub fn with_total_size_bytes(mut self, size: u64) -> Self {
        self.total_size_bytes = Some(size);
        self
    }

    pub fn with_filtered_file_count(mut self, count: u32) -> Self {
        self.filtered_file_count = Some(count);
        self
    }

    pub fn with_filter_result(mut self, result: FilterResult) -> Self {
        self.filter_result = Some(result);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_str_round_trip() {
        let all = [
            TorrentStatus::WaitingMetadata,
            TorrentStatus::MetadataReady,
            TorrentStatus::Filtering,
            TorrentStatus::Completed,
            TorrentStatus::Failed,
            TorrentStatus::TimedOut,
        ];
        for status in all {
            assert_eq!(TorrentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TorrentStatus::parse("bogus"), None);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&TorrentStatus::WaitingMetadata).unwrap();
        assert_eq!(json, "\"waiting_metadata\"");
        let back: TorrentStatus = serde_json::from_str("\"timed_out\"").unwrap();
        assert_eq!(back, TorrentStatus::TimedOut);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TorrentStatus::WaitingMetadata.is_terminal());
        assert!(!TorrentStatus::MetadataReady.is_terminal());
        assert!(!TorrentStatus::Filtering.is_terminal());
        assert!(TorrentStatus::Completed.is_terminal());
        assert!(TorrentStatus::Failed.is_terminal());
        assert!(TorrentStatus::TimedOut.is_terminal());
    }

    #[test]
    fn test_forward_edges() {
        use TorrentStatus::*;
        assert!(WaitingMetadata.can_transition_to(MetadataReady));
        assert!(MetadataReady.can_transition_to(Filtering));
        assert!(Filtering.can_transition_to(Completed));

        // Skipping a stage is not allowed
        assert!(!WaitingMetadata.can_transition_to(Filtering));
        assert!(!WaitingMetadata.can_transition_to(Completed));
        assert!(!MetadataReady.can_transition_to(Completed));

        // No edges back
        assert!(!MetadataReady.can_transition_to(WaitingMetadata));
        assert!(!Filtering.can_transition_to(MetadataReady));
    }

    #[test]
    fn test_failure_and_timeout_from_any_non_terminal() {
        use TorrentStatus::*;
        for status in [WaitingMetadata, MetadataReady, Filtering] {
            assert!(status.can_transition_to(Failed));
            assert!(status.can_transition_to(TimedOut));
        }
    }

    #[test]
    fn test_terminals_are_absorbing() {
        use TorrentStatus::*;
        for terminal in [Completed, Failed, TimedOut] {
            for next in [
                WaitingMetadata,
                MetadataReady,
                Filtering,
                Completed,
                Failed,
                TimedOut,
            ] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} must be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_audit_context_correlation_ids_differ() {
        let a = AuditContext::new("watcher");
        let b = AuditContext::new("watcher");
        assert_eq!(a.actor, "watcher");
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn test_transition_fields_builder() {
        let now = Utc::now();
        let fields = TransitionFields::new()
            .with_file_count(3)
            .with_total_size_bytes(4096)
            .with_error_message("boom")
            .with_completed_at(now);
        assert_eq!(fields.file_count, Some(3));
        assert_eq!(fields.total_size_bytes, Some(4096));
        assert_eq!(fields.error_message.as_deref(), Some("boom"));
        assert_eq!(fields.completed_at, Some(now));
        assert!(fields.filter_result.is_none());
    }
}
