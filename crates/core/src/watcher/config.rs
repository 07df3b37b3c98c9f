//! Watcher configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the torrent watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Enable/disable the watcher.
    /// When disabled, registered torrents sit in the store untouched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often to scan pending torrents (milliseconds).
    /// Each tick advances every pending torrent by at most one stage.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Metadata checks allowed before a torrent times out.
    /// The budget is consumed only by checks that find metadata missing.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Discovery of torrents added directly to the download client.
    #[serde(default)]
    pub intake: IntakeConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    30_000 // 30 seconds
}

fn default_max_retries() -> u32 {
    30
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tick_interval_ms: default_tick_interval(),
            max_retries: default_max_retries(),
            intake: IntakeConfig::default(),
        }
    }
}

/// Configuration for the intake discovery loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Enable/disable intake discovery.
    #[serde(default)]
    pub enabled: bool,

    /// Only discover torrents in this client category.
    /// When unset, every torrent in the client is a candidate.
    #[serde(default)]
    pub category: Option<String>,

    /// How often to poll the client for new torrents (milliseconds).
    #[serde(default = "default_intake_interval")]
    pub poll_interval_ms: u64,
}

fn default_intake_interval() -> u64 {
    300_000 // 5 minutes
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            category: None,
            poll_interval_ms: default_intake_interval(),
        }
    }
}
