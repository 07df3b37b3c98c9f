//! Mock settings provider for testing.

use std::sync::RwLock;

use crate::filter::FilterSettings;
use crate::settings::{SettingsError, SettingsProvider};

/// Mock implementation of the SettingsProvider trait.
///
/// Holds settings in memory; `set` swaps the policy a later tick will see,
/// mirroring an operator edit mid-run.
#[derive(Debug)]
pub struct MockSettingsProvider {
    settings: RwLock<FilterSettings>,
    fail: RwLock<bool>,
}

impl MockSettingsProvider {
    /// Create a provider serving the given settings.
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            fail: RwLock::new(false),
        }
    }

    /// Replace the active settings.
    pub fn set(&self, settings: FilterSettings) {
        *self.settings.write().unwrap() = settings;
    }

    /// Make every subsequent `active` call fail.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.write().unwrap() = fail;
    }
}

impl Default for MockSettingsProvider {
    fn default() -> Self {
        Self::new(FilterSettings::default())
    }
}

impl SettingsProvider for MockSettingsProvider {
    fn active(&self) -> Result<FilterSettings, SettingsError> {
        if *self.fail.read().unwrap() {
            return Err(SettingsError::Database("mock failure".to_string()));
        }
        Ok(self.settings.read().unwrap().clone())
    }
}
