//! Pending torrent lifecycle
//!
//! A pending torrent is a record keyed by info-hash, tracking a torrent
//! handed to the download client until its file list has been fetched and
//! filtered. Status moves forward only, through compare-and-swap writes:
//!
//! `WaitingMetadata -> MetadataReady -> Filtering -> Completed`
//!
//! with `Failed` and `TimedOut` reachable from any non-terminal status.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqlitePendingStore;
pub use store::{PendingTorrentStore, StoreError};
pub use types::{
    AuditContext, NewPendingTorrent, PendingTorrent, TorrentStatus, TransitionFields,
};
