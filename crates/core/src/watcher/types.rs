//! Types for the torrent watcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while watching torrents.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Pending torrent not found.
    #[error("pending torrent not found: {0}")]
    TorrentNotFound(String),

    /// Pending store error.
    #[error("pending store error: {0}")]
    Store(#[from] crate::pending::StoreError),

    /// Settings provider error.
    #[error("settings error: {0}")]
    Settings(#[from] crate::settings::SettingsError),

    /// Download client error.
    #[error("download client error: {0}")]
    Client(#[from] crate::download_client::DownloadClientError),
}

/// Current status of the watcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatcherStatus {
    /// Whether the watcher is running.
    pub running: bool,
    /// Torrents waiting for metadata.
    pub waiting_metadata: usize,
    /// Torrents with metadata ready to filter.
    pub metadata_ready: usize,
    /// Torrents mid-filter.
    pub filtering: usize,
    /// Torrents filtered successfully.
    pub completed: usize,
    /// Torrents that failed.
    pub failed: usize,
    /// Torrents that ran out of metadata checks.
    pub timed_out: usize,
}

/// A request to put a torrent under watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Torrent info hash, as the download client reports it.
    pub torrent_hash: String,
    /// Magnet link for the torrent.
    pub magnet_link: String,
    /// Where the client saves the payload.
    pub save_path: String,
    /// Client category, if any.
    #[serde(default)]
    pub category: Option<String>,
    /// Release numbering tag, if known (e.g. "S02E05").
    #[serde(default)]
    pub video_number: Option<String>,
    /// Who asked for this torrent (e.g. "api", "intake").
    pub source_tag: String,
}
