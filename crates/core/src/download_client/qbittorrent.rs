//! qBittorrent download client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;
use crate::filter::{FileDescriptor, TorrentMeta};

use super::{ClientTorrent, DownloadClient, DownloadClientError, MetadataStatus, TorrentState};

/// qBittorrent Web API client.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Session marker (refreshed on auth failure); the cookie jar holds the
    /// actual SID cookie.
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    pub fn new(config: QBittorrentConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and mark the session authenticated.
    async fn login(&self) -> Result<(), DownloadClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloadClientError::Timeout
                } else if e.is_connect() {
                    DownloadClientError::ConnectionFailed(e.to_string())
                } else {
                    DownloadClientError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            // Session cookie is stored by the cookie jar
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(DownloadClientError::AuthenticationFailed(
                "invalid credentials".to_string(),
            ))
        } else {
            Err(DownloadClientError::AuthenticationFailed(format!(
                "unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), DownloadClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Make an authenticated GET request, re-authenticating once on 403.
    async fn get(&self, endpoint: &str) -> Result<String, DownloadClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadClientError::Timeout
            } else if e.is_connect() {
                DownloadClientError::ConnectionFailed(e.to_string())
            } else {
                DownloadClientError::ApiError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 403 {
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| DownloadClientError::ApiError(e.to_string()))?;

            if !response.status().is_success() {
                return Err(DownloadClientError::ApiError(format!(
                    "HTTP {}",
                    response.status()
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| DownloadClientError::ApiError(e.to_string()));
        }

        if !status.is_success() {
            return Err(DownloadClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadClientError::ApiError(e.to_string()))
    }
}

/// Torrent entry from `/api/v2/torrents/info`.
#[derive(Debug, Deserialize)]
struct QBTorrentEntry {
    hash: String,
    name: String,
    state: String,
    size: i64,
    num_complete: i64,
    save_path: String,
    category: String,
    added_on: i64,
}

impl QBTorrentEntry {
    fn into_client_torrent(self) -> ClientTorrent {
        ClientTorrent {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state: parse_qb_state(&self.state),
            size_bytes: self.size.max(0) as u64,
            seeders: self.num_complete.max(0) as u32,
            save_path: if self.save_path.is_empty() {
                None
            } else {
                Some(self.save_path)
            },
            category: if self.category.is_empty() {
                None
            } else {
                Some(self.category)
            },
            added_at: timestamp_to_datetime(self.added_on),
        }
    }
}

/// File entry from `/api/v2/torrents/files`.
#[derive(Debug, Deserialize)]
struct QBFileEntry {
    /// Path relative to the torrent root, '/'-separated.
    name: String,
    size: i64,
}

impl QBFileEntry {
    fn into_descriptor(self) -> FileDescriptor {
        let name = self.name.rsplit('/').next().unwrap_or(&self.name).to_string();
        FileDescriptor {
            name,
            size_bytes: self.size.max(0) as u64,
            relative_path: self.name,
        }
    }
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "metaDL" | "forcedMetaDL" => TorrentState::FetchingMetadata,
        "downloading" | "forcedDL" | "allocating" => TorrentState::Downloading,
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Paused,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "stalledDL" | "stalledUP" => TorrentState::Stalled,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

/// Convert Unix timestamp to DateTime<Utc>.
fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        Utc.timestamp_opt(ts, 0).single()
    } else {
        None
    }
}

#[async_trait]
impl DownloadClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn fetch_metadata(&self, hash: &str) -> Result<MetadataStatus, DownloadClientError> {
        let hash_lower = hash.to_lowercase();
        let endpoint = format!("/api/v2/torrents/info?hashes={}", hash_lower);
        let response = self.get(&endpoint).await?;

        let torrents: Vec<QBTorrentEntry> = serde_json::from_str(&response).map_err(|e| {
            DownloadClientError::ApiError(format!("failed to parse torrent info: {}", e))
        })?;
        let entry = torrents
            .into_iter()
            .next()
            .ok_or_else(|| DownloadClientError::TorrentNotFound(hash.to_string()))?;

        match parse_qb_state(&entry.state) {
            TorrentState::FetchingMetadata => return Ok(MetadataStatus::NotReady),
            TorrentState::Error => {
                return Err(DownloadClientError::InvalidTorrent(format!(
                    "client reports state '{}'",
                    entry.state
                )))
            }
            _ => {}
        }

        let files_endpoint = format!("/api/v2/torrents/files?hash={}", hash_lower);
        let response = self.get(&files_endpoint).await?;
        let entries: Vec<QBFileEntry> = serde_json::from_str(&response).map_err(|e| {
            DownloadClientError::ApiError(format!("failed to parse file list: {}", e))
        })?;

        // The info endpoint can report a resolved state slightly before the
        // file list is queryable
        if entries.is_empty() {
            return Ok(MetadataStatus::NotReady);
        }

        let files: Vec<FileDescriptor> = entries
            .into_iter()
            .map(|entry| entry.into_descriptor())
            .collect();
        let meta = TorrentMeta {
            total_size_bytes: entry.size.max(0) as u64,
            seeders: Some(entry.num_complete.max(0) as u32),
        };

        debug!(
            "fetched metadata for {}: {} files, {} bytes",
            hash_lower,
            files.len(),
            meta.total_size_bytes
        );
        Ok(MetadataStatus::Ready { files, meta })
    }

    async fn list_torrents(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        let mut endpoint = "/api/v2/torrents/info".to_string();
        if let Some(category) = category {
            endpoint.push_str(&format!("?category={}", urlencoding::encode(category)));
        }

        let response = self.get(&endpoint).await?;
        let torrents: Vec<QBTorrentEntry> = serde_json::from_str(&response).map_err(|e| {
            DownloadClientError::ApiError(format!("failed to parse torrent list: {}", e))
        })?;

        Ok(torrents
            .into_iter()
            .map(|t| t.into_client_torrent())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qb_state_metadata_fetch() {
        assert_eq!(parse_qb_state("metaDL"), TorrentState::FetchingMetadata);
        assert_eq!(
            parse_qb_state("forcedMetaDL"),
            TorrentState::FetchingMetadata
        );
    }

    #[test]
    fn test_parse_qb_state_common_states() {
        assert_eq!(parse_qb_state("downloading"), TorrentState::Downloading);
        assert_eq!(parse_qb_state("uploading"), TorrentState::Seeding);
        assert_eq!(parse_qb_state("pausedDL"), TorrentState::Paused);
        assert_eq!(parse_qb_state("stalledUP"), TorrentState::Stalled);
        assert_eq!(parse_qb_state("error"), TorrentState::Error);
        assert_eq!(parse_qb_state("missingFiles"), TorrentState::Error);
    }

    #[test]
    fn test_parse_qb_state_unknown() {
        assert_eq!(parse_qb_state("somethingNew"), TorrentState::Unknown);
    }

    #[test]
    fn test_file_entry_extracts_name_from_path() {
        let entry = QBFileEntry {
            name: "Movie (2024)/movie.mkv".to_string(),
            size: 1000,
        };
        let descriptor = entry.into_descriptor();
        assert_eq!(descriptor.name, "movie.mkv");
        assert_eq!(descriptor.relative_path, "Movie (2024)/movie.mkv");
        assert_eq!(descriptor.size_bytes, 1000);
    }

    #[test]
    fn test_file_entry_without_directory() {
        let entry = QBFileEntry {
            name: "movie.mkv".to_string(),
            size: -5,
        };
        let descriptor = entry.into_descriptor();
        assert_eq!(descriptor.name, "movie.mkv");
        assert_eq!(descriptor.relative_path, "movie.mkv");
        // Negative sizes from the API clamp to zero
        assert_eq!(descriptor.size_bytes, 0);
    }

    #[test]
    fn test_torrent_entry_conversion() {
        let entry = QBTorrentEntry {
            hash: "ABCDEF1234".to_string(),
            name: "Movie".to_string(),
            state: "downloading".to_string(),
            size: 1000,
            num_complete: 42,
            save_path: "/downloads".to_string(),
            category: String::new(),
            added_on: 1700000000,
        };
        let torrent = entry.into_client_torrent();
        assert_eq!(torrent.hash, "abcdef1234");
        assert_eq!(torrent.state, TorrentState::Downloading);
        assert_eq!(torrent.seeders, 42);
        assert_eq!(torrent.save_path.as_deref(), Some("/downloads"));
        assert!(torrent.category.is_none());
        assert!(torrent.added_at.is_some());
    }

    #[test]
    fn test_timestamp_to_datetime() {
        assert!(timestamp_to_datetime(1700000000).is_some());
        assert!(timestamp_to_datetime(0).is_none());
        assert!(timestamp_to_datetime(-1).is_none());
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = QBittorrentConfig {
            url: "http://localhost:8080/".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            timeout_secs: 30,
        };
        let client = QBittorrentClient::new(config);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
