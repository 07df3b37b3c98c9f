//! SQLite-backed filter settings store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::filter::FilterSettings;
use crate::pending::AuditContext;

use super::{SettingsError, SettingsProvider};

/// Singleton-row settings store: the active policy is always row 1.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    pub fn new(path: &Path) -> Result<Self, SettingsError> {
        let conn = Connection::open(path).map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, SettingsError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SettingsError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS filter_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                updated_by TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(())
    }

    /// Seed the active settings on first run. An existing row wins, so a
    /// restart never clobbers operator changes.
    pub fn ensure_active(
        &self,
        defaults: &FilterSettings,
        ctx: &AuditContext,
    ) -> Result<(), SettingsError> {
        let json = serde_json::to_string(defaults)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO filter_settings (id, data, updated_at, updated_by)
             VALUES (1, ?1, ?2, ?3)",
            params![json, Utc::now().to_rfc3339(), ctx.actor],
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(())
    }

    /// Replace the active settings. Takes effect on the next watcher tick.
    pub fn set_active(
        &self,
        settings: &FilterSettings,
        ctx: &AuditContext,
    ) -> Result<(), SettingsError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO filter_settings (id, data, updated_at, updated_by)
             VALUES (1, ?1, ?2, ?3)",
            params![json, Utc::now().to_rfc3339(), ctx.actor],
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(())
    }
}

impl SettingsProvider for SqliteSettingsStore {
    fn active(&self) -> Result<FilterSettings, SettingsError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row("SELECT data FROM filter_settings WHERE id = 1", [], |row| {
            row.get::<_, String>(0)
        });
        match result {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| SettingsError::Serialization(e.to_string())),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(FilterSettings::default()),
            Err(e) => Err(SettingsError::Database(e.to_string())),
        }
    }
}
