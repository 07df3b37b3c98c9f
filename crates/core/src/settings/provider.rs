use thiserror::Error;

use crate::filter::FilterSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read access to the active filter policy.
pub trait SettingsProvider: Send + Sync {
    fn active(&self) -> Result<FilterSettings, SettingsError>;
}
