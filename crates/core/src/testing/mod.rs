//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external service traits,
//! allowing the full torrent lifecycle to be tested without real
//! infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use curatorr_core::testing::{MockDownloadClient, MockSettingsProvider};
//!
//! let client = MockDownloadClient::new();
//! let settings = MockSettingsProvider::default();
//!
//! // Configure mock responses
//! client.set_torrent("abc123", files, meta).await;
//!
//! // Use with TorrentWatcher...
//! ```

mod mock_download_client;
mod mock_settings;

pub use mock_download_client::MockDownloadClient;
pub use mock_settings::MockSettingsProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::download_client::{ClientTorrent, TorrentState};
    use crate::filter::{FileDescriptor, TorrentMeta};

    /// A 40-char hex info hash built from a single repeated character.
    pub fn test_hash(c: char) -> String {
        c.to_string().repeat(40)
    }

    /// Create a media file descriptor with reasonable defaults.
    pub fn media_file(name: &str, size_mb: u64) -> FileDescriptor {
        FileDescriptor::new(name, size_mb * 1024 * 1024, format!("Release/{}", name))
    }

    /// Create a subtitle file descriptor.
    pub fn subtitle_file(name: &str) -> FileDescriptor {
        FileDescriptor::new(name, 64 * 1024, format!("Release/Subs/{}", name))
    }

    /// Create a sample file descriptor.
    pub fn sample_file(name: &str, size_mb: u64) -> FileDescriptor {
        FileDescriptor::new(name, size_mb * 1024 * 1024, format!("Release/Sample/{}", name))
    }

    /// Torrent metadata summing the given files, with healthy seeders.
    pub fn meta_for(files: &[FileDescriptor]) -> TorrentMeta {
        TorrentMeta {
            total_size_bytes: files.iter().map(|f| f.size_bytes).sum(),
            seeders: Some(25),
        }
    }

    /// Create a client torrent listing entry with reasonable defaults.
    pub fn client_torrent(hash: &str, category: Option<&str>) -> ClientTorrent {
        ClientTorrent {
            hash: hash.to_string(),
            name: format!("Release-{}", hash),
            state: TorrentState::Downloading,
            size_bytes: 1024 * 1024 * 700,
            seeders: 12,
            save_path: Some("/mock/downloads".to_string()),
            category: category.map(String::from),
            added_at: None,
        }
    }
}
