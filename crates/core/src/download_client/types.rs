use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::filter::{FileDescriptor, TorrentMeta};

#[derive(Debug, Error)]
pub enum DownloadClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("torrent unusable: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("request timed out")]
    Timeout,
}

impl DownloadClientError {
    /// Hard errors mean the torrent itself cannot recover, so the record is
    /// failed instead of retried. Everything else is transient and consumes
    /// retry budget exactly like a not-ready poll.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            DownloadClientError::TorrentNotFound(_) | DownloadClientError::InvalidTorrent(_)
        )
    }
}

/// Client-side lifecycle state of a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentState {
    /// Magnet added, file list not resolved yet.
    FetchingMetadata,
    Downloading,
    Seeding,
    Paused,
    Checking,
    Queued,
    Stalled,
    Error,
    Unknown,
}

impl TorrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::FetchingMetadata => "fetching_metadata",
            TorrentState::Downloading => "downloading",
            TorrentState::Seeding => "seeding",
            TorrentState::Paused => "paused",
            TorrentState::Checking => "checking",
            TorrentState::Queued => "queued",
            TorrentState::Stalled => "stalled",
            TorrentState::Error => "error",
            TorrentState::Unknown => "unknown",
        }
    }
}

/// A torrent as the download client reports it.
#[derive(Debug, Clone)]
pub struct ClientTorrent {
    /// Info-hash, lowercased.
    pub hash: String,
    pub name: String,
    pub state: TorrentState,
    pub size_bytes: u64,
    /// Seeders in the swarm, not just currently connected peers.
    pub seeders: u32,
    pub save_path: Option<String>,
    pub category: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

/// Result of asking the client for a torrent's file list.
#[derive(Debug, Clone)]
pub enum MetadataStatus {
    /// The client knows the torrent but has not resolved its files yet.
    NotReady,
    Ready {
        files: Vec<FileDescriptor>,
        meta: TorrentMeta,
    },
}

/// Boundary to the external download client.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Client implementation name, for logging.
    fn name(&self) -> &str;

    /// Per-file metadata for a torrent the client tracks.
    async fn fetch_metadata(&self, hash: &str) -> Result<MetadataStatus, DownloadClientError>;

    /// All torrents the client tracks, optionally restricted to a category.
    async fn list_torrents(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<ClientTorrent>, DownloadClientError>;
}
