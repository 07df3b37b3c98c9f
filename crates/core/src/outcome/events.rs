use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::FilterResult;

/// Outcome event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Torrent lifecycle
    TorrentRegistered {
        torrent_hash: String,
        source_tag: String,
        save_path: String,
    },
    TorrentCompleted {
        torrent_hash: String,
        filter_result: FilterResult,
        completed_at: DateTime<Utc>,
    },
    TorrentFailed {
        torrent_hash: String,
        error_message: String,
        completed_at: DateTime<Utc>,
    },
    TorrentTimedOut {
        torrent_hash: String,
        error_message: String,
        retry_count: u32,
        completed_at: DateTime<Utc>,
    },
}

impl OutcomeEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TorrentRegistered { .. } => "torrent_registered",
            Self::TorrentCompleted { .. } => "torrent_completed",
            Self::TorrentFailed { .. } => "torrent_failed",
            Self::TorrentTimedOut { .. } => "torrent_timed_out",
        }
    }

    /// Extract the torrent hash if this event is tied to a torrent
    pub fn torrent_hash(&self) -> Option<&str> {
        match self {
            Self::TorrentRegistered { torrent_hash, .. }
            | Self::TorrentCompleted { torrent_hash, .. }
            | Self::TorrentFailed { torrent_hash, .. }
            | Self::TorrentTimedOut { torrent_hash, .. } => Some(torrent_hash),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }
}

/// A persisted outcome record with storage metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub torrent_hash: Option<String>,
    pub actor: Option<String>,
    pub correlation_id: Option<String>,
    pub data: OutcomeEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_service_started() {
        let event = OutcomeEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc123".to_string(),
        };
        assert_eq!(event.event_type(), "service_started");
        assert_eq!(event.torrent_hash(), None);
    }

    #[test]
    fn test_event_type_torrent_registered() {
        let event = OutcomeEvent::TorrentRegistered {
            torrent_hash: "a".repeat(40),
            source_tag: "api".to_string(),
            save_path: "/downloads".to_string(),
        };
        assert_eq!(event.event_type(), "torrent_registered");
        assert_eq!(event.torrent_hash(), Some("a".repeat(40).as_str()));
    }

    #[test]
    fn test_event_type_terminal_events() {
        let completed = OutcomeEvent::TorrentCompleted {
            torrent_hash: "abc".to_string(),
            filter_result: FilterResult::from_kept(vec![], true),
            completed_at: Utc::now(),
        };
        let failed = OutcomeEvent::TorrentFailed {
            torrent_hash: "abc".to_string(),
            error_message: "boom".to_string(),
            completed_at: Utc::now(),
        };
        let timed_out = OutcomeEvent::TorrentTimedOut {
            torrent_hash: "abc".to_string(),
            error_message: "metadata never arrived".to_string(),
            retry_count: 30,
            completed_at: Utc::now(),
        };

        assert_eq!(completed.event_type(), "torrent_completed");
        assert_eq!(failed.event_type(), "torrent_failed");
        assert_eq!(timed_out.event_type(), "torrent_timed_out");
        assert_eq!(completed.torrent_hash(), Some("abc"));
        assert_eq!(failed.torrent_hash(), Some("abc"));
        assert_eq!(timed_out.torrent_hash(), Some("abc"));
    }

    #[test]
    fn test_serialization_tagged() {
        let event = OutcomeEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"service_stopped\""));
        assert!(json.contains("\"reason\":\"graceful_shutdown\""));

        let back: OutcomeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type(), "service_stopped");
    }

    #[test]
    fn test_serialization_round_trip_with_filter_result() {
        let event = OutcomeEvent::TorrentCompleted {
            torrent_hash: "deadbeef".to_string(),
            filter_result: FilterResult::from_kept(vec![], true),
            completed_at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: OutcomeEvent = serde_json::from_str(&json).unwrap();
        match back {
            OutcomeEvent::TorrentCompleted { filter_result, .. } => {
                assert!(filter_result.passed);
                assert_eq!(filter_result.kept_count, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
