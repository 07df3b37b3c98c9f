//! Mock download client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::download_client::{
    ClientTorrent, DownloadClient, DownloadClientError, MetadataStatus,
};
use crate::filter::{FileDescriptor, TorrentMeta};

/// Internal state for a mock torrent.
#[derive(Debug, Clone)]
struct MockEntry {
    files: Vec<FileDescriptor>,
    meta: TorrentMeta,
    /// Metadata checks that still report NotReady before files appear.
    /// `u32::MAX` means the metadata never arrives.
    not_ready_remaining: u32,
}

/// Mock implementation of the DownloadClient trait.
///
/// Provides controllable behavior for testing:
/// - Stage per-torrent metadata, optionally delayed by N checks
/// - Record fetch calls for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDownloadClient::new();
///
/// // Metadata becomes available on the third check.
/// client.set_torrent_not_ready("abc123", 2, files, meta).await;
///
/// assert!(matches!(client.fetch_metadata("abc123").await?, MetadataStatus::NotReady));
/// assert!(matches!(client.fetch_metadata("abc123").await?, MetadataStatus::NotReady));
/// assert!(matches!(client.fetch_metadata("abc123").await?, MetadataStatus::Ready { .. }));
/// ```
#[derive(Debug)]
pub struct MockDownloadClient {
    /// Staged torrents by hash.
    torrents: Arc<RwLock<HashMap<String, MockEntry>>>,
    /// Recorded fetch_metadata calls.
    fetch_calls: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<DownloadClientError>>>,
    /// Torrents returned by list_torrents.
    listing: Arc<RwLock<Vec<ClientTorrent>>>,
}

impl Default for MockDownloadClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloadClient {
    /// Create a new mock download client.
    pub fn new() -> Self {
        Self {
            torrents: Arc::new(RwLock::new(HashMap::new())),
            fetch_calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            listing: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Stage a torrent whose metadata is available immediately.
    pub async fn set_torrent(&self, hash: &str, files: Vec<FileDescriptor>, meta: TorrentMeta) {
        self.torrents.write().await.insert(
            hash.to_string(),
            MockEntry {
                files,
                meta,
                not_ready_remaining: 0,
            },
        );
    }

    /// Stage a torrent whose metadata arrives after `checks` NotReady polls.
    pub async fn set_torrent_not_ready(
        &self,
        hash: &str,
        checks: u32,
        files: Vec<FileDescriptor>,
        meta: TorrentMeta,
    ) {
        self.torrents.write().await.insert(
            hash.to_string(),
            MockEntry {
                files,
                meta,
                not_ready_remaining: checks,
            },
        );
    }

    /// Stage a torrent whose metadata never arrives.
    pub async fn set_torrent_never_ready(&self, hash: &str) {
        self.torrents.write().await.insert(
            hash.to_string(),
            MockEntry {
                files: Vec::new(),
                meta: TorrentMeta {
                    total_size_bytes: 0,
                    seeders: None,
                },
                not_ready_remaining: u32::MAX,
            },
        );
    }

    /// Fail the next operation with this error.
    pub async fn set_next_error(&self, error: DownloadClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the torrents returned by list_torrents.
    pub async fn set_listing(&self, torrents: Vec<ClientTorrent>) {
        *self.listing.write().await = torrents;
    }

    /// Get all recorded fetch_metadata calls.
    pub async fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.read().await.clone()
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(&self, hash: &str) -> Result<MetadataStatus, DownloadClientError> {
        self.fetch_calls.write().await.push(hash.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let mut torrents = self.torrents.write().await;
        let entry = torrents
            .get_mut(hash)
            .ok_or_else(|| DownloadClientError::TorrentNotFound(hash.to_string()))?;

        if entry.not_ready_remaining == u32::MAX {
            return Ok(MetadataStatus::NotReady);
        }
        if entry.not_ready_remaining > 0 {
            entry.not_ready_remaining -= 1;
            return Ok(MetadataStatus::NotReady);
        }

        Ok(MetadataStatus::Ready {
            files: entry.files.clone(),
            meta: entry.meta,
        })
    }

    async fn list_torrents(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let listing = self.listing.read().await;
        Ok(listing
            .iter()
            .filter(|t| match category {
                Some(c) => t.category.as_deref() == Some(c),
                None => true,
            })
            .cloned()
            .collect())
    }
}
