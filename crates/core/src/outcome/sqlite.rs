use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{OutcomeError, OutcomeEvent, OutcomeFilter, OutcomeRecord, OutcomeStore};

/// SQLite-backed outcome store
pub struct SqliteOutcomeStore {
    conn: Mutex<Connection>,
}

impl SqliteOutcomeStore {
    /// Create a new SQLite outcome store, creating the database file and tables if needed
    pub fn new(path: &Path) -> Result<Self, OutcomeError> {
        let conn = Connection::open(path).map_err(|e| OutcomeError::Database(e.to_string()))?;

        // Create tables
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS outcome_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                torrent_hash TEXT,
                actor TEXT,
                correlation_id TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_outcome_events_timestamp ON outcome_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_outcome_events_torrent_hash ON outcome_events(torrent_hash);
            CREATE INDEX IF NOT EXISTS idx_outcome_events_event_type ON outcome_events(event_type);
            "#,
        )
        .map_err(|e| OutcomeError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite outcome store (useful for testing)
    pub fn in_memory() -> Result<Self, OutcomeError> {
        let conn =
            Connection::open_in_memory().map_err(|e| OutcomeError::Database(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS outcome_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                torrent_hash TEXT,
                actor TEXT,
                correlation_id TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_outcome_events_timestamp ON outcome_events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_outcome_events_torrent_hash ON outcome_events(torrent_hash);
            CREATE INDEX IF NOT EXISTS idx_outcome_events_event_type ON outcome_events(event_type);
            "#,
        )
        .map_err(|e| OutcomeError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn build_where_clause(filter: &OutcomeFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref torrent_hash) = filter.torrent_hash {
            conditions.push("torrent_hash = ?");
            params.push(Box::new(torrent_hash.clone()));
        }

        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            params.push(Box::new(event_type.clone()));
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl OutcomeStore for SqliteOutcomeStore {
    fn insert(&self, record: &OutcomeRecord) -> Result<i64, OutcomeError> {
        let conn = self.conn.lock().unwrap();

        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| OutcomeError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO outcome_events (timestamp, event_type, torrent_hash, actor, correlation_id, data) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.torrent_hash,
                record.actor,
                record.correlation_id,
                data_json,
            ],
        )
        .map_err(|e| OutcomeError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &OutcomeFilter) -> Result<Vec<OutcomeRecord>, OutcomeError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, timestamp, event_type, torrent_hash, actor, correlation_id, data FROM outcome_events {} ORDER BY timestamp DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| OutcomeError::Database(e.to_string()))?;

        // Build parameter slice with limit and offset
        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let id: i64 = row.get(0)?;
                let timestamp_str: String = row.get(1)?;
                let event_type: String = row.get(2)?;
                let torrent_hash: Option<String> = row.get(3)?;
                let actor: Option<String> = row.get(4)?;
                let correlation_id: Option<String> = row.get(5)?;
                let data_json: String = row.get(6)?;

                Ok((
                    id,
                    timestamp_str,
                    event_type,
                    torrent_hash,
                    actor,
                    correlation_id,
                    data_json,
                ))
            })
            .map_err(|e| OutcomeError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            let (id, timestamp_str, event_type, torrent_hash, actor, correlation_id, data_json) =
                row_result.map_err(|e| OutcomeError::Database(e.to_string()))?;

            let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|e| OutcomeError::Database(format!("Invalid timestamp: {}", e)))?
                .into();

            let data: OutcomeEvent = serde_json::from_str(&data_json)
                .map_err(|e| OutcomeError::Serialization(e.to_string()))?;

            records.push(OutcomeRecord {
                id,
                timestamp,
                event_type,
                torrent_hash,
                actor,
                correlation_id,
                data,
            });
        }

        Ok(records)
    }

    fn count(&self, filter: &OutcomeFilter) -> Result<i64, OutcomeError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM outcome_events {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| OutcomeError::Database(e.to_string()))?;

        Ok(count)
    }
}
