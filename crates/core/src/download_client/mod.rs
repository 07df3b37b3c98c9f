//! Download client boundary
//!
//! The watcher talks to the external download client only through the
//! [`DownloadClient`] trait: enumerate torrents and fetch per-file metadata.
//! The only implementation is qBittorrent (Web API).

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::{
    ClientTorrent, DownloadClient, DownloadClientError, MetadataStatus, TorrentState,
};
