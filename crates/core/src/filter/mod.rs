//! Filter policy evaluation
//!
//! Decides which files of a torrent are worth keeping:
//! - classifies files as media, subtitle, sample or other
//! - applies extension, size and sample rules in a fixed order
//! - rejects subtitle-only torrents and torrents below seed/size thresholds
//!
//! Evaluation is pure: no I/O, no clock, same inputs same output.

mod classify;
mod evaluator;
mod types;

pub use classify::classify;
pub use evaluator::evaluate;
pub use types::{
    FileDescriptor, FileKind, FilterError, FilterResult, FilterSettings, TorrentMeta,
};
