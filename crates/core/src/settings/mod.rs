//! Filter settings storage
//!
//! The active [`FilterSettings`](crate::filter::FilterSettings) live in the
//! database so an operator or companion tool can change them between ticks.
//! The watcher reads them once per tick through [`SettingsProvider`];
//! changes apply from the next tick.

mod provider;
mod sqlite;

pub use provider::{SettingsError, SettingsProvider};
pub use sqlite::SqliteSettingsStore;
