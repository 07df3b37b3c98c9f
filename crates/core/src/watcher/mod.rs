//! Torrent watcher for automated intake filtering.
//!
//! The watcher drives pending torrents through their lifecycle automatically:
//! - **Metadata**: Polls the download client until file lists arrive
//! - **Filtering**: Evaluates arrivals against the active filter policy
//! - **Intake**: Optionally discovers torrents added directly to the client

mod config;
mod runner;
mod types;

pub use config::{IntakeConfig, WatcherConfig};
pub use runner::TorrentWatcher;
pub use types::{RegisterRequest, WatcherError, WatcherStatus};
