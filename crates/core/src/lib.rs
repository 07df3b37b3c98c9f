pub mod config;
pub mod download_client;
pub mod filter;
pub mod metrics;
pub mod outcome;
pub mod pending;
pub mod settings;
pub mod testing;
pub mod watcher;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    QBittorrentConfig, SanitizedConfig,
};
pub use download_client::{
    ClientTorrent, DownloadClient, DownloadClientError, MetadataStatus, QBittorrentClient,
    TorrentState,
};
pub use filter::{
    evaluate, FileDescriptor, FileKind, FilterError, FilterResult, FilterSettings, TorrentMeta,
};
pub use outcome::{
    create_outcome_system, OutcomeEnvelope, OutcomeError, OutcomeEvent, OutcomeFilter,
    OutcomeHandle, OutcomeRecord, OutcomeStore, OutcomeWriter, SqliteOutcomeStore,
};
pub use pending::{
    AuditContext, NewPendingTorrent, PendingTorrent, PendingTorrentStore, SqlitePendingStore,
    StoreError, TorrentStatus, TransitionFields,
};
pub use settings::{SettingsError, SettingsProvider, SqliteSettingsStore};
pub use watcher::{
    IntakeConfig, RegisterRequest, TorrentWatcher, WatcherConfig, WatcherError, WatcherStatus,
};
