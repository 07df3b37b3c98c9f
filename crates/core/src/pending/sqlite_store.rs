//! SQLite-backed pending torrent store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    AuditContext, NewPendingTorrent, PendingTorrent, PendingTorrentStore, StoreError,
    TorrentStatus, TransitionFields,
};

const SELECT_COLUMNS: &str = "torrent_hash, magnet_link, save_path, category, video_number, \
     source_tag, status, retry_count, max_retries, filter_result, error_message, added_at, \
     last_check_at, completed_at, file_count, total_size_bytes, filtered_file_count, \
     created_by, updated_by, updated_at";

/// SQLite-backed pending torrent store.
pub struct SqlitePendingStore {
    conn: Mutex<Connection>,
}

impl SqlitePendingStore {
    /// Open the store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pending_torrents (
                torrent_hash TEXT PRIMARY KEY,
                magnet_link TEXT NOT NULL,
                save_path TEXT NOT NULL,
                category TEXT,
                video_number TEXT,
                source_tag TEXT NOT NULL,
                status TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                max_retries INTEGER NOT NULL,
                filter_result TEXT,
                error_message TEXT,
                added_at TEXT NOT NULL,
                last_check_at TEXT,
                completed_at TEXT,
                file_count INTEGER,
                total_size_bytes INTEGER,
                filtered_file_count INTEGER,
                created_by TEXT NOT NULL,
                updated_by TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pending_torrents_status ON pending_torrents(status);
            CREATE INDEX IF NOT EXISTS idx_pending_torrents_added_at ON pending_torrents(added_at);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        // Migration: add video_number column if it doesn't exist
        let _ = conn.execute("ALTER TABLE pending_torrents ADD COLUMN video_number TEXT", []);

        Ok(())
    }

    fn fetch_record(
        conn: &Connection,
        torrent_hash: &str,
    ) -> Result<Option<PendingTorrent>, StoreError> {
        let query = format!(
            "SELECT {} FROM pending_torrents WHERE torrent_hash = ?1",
            SELECT_COLUMNS
        );
        let result = conn.query_row(&query, params![torrent_hash], Self::row_to_pending);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn current_status(
        conn: &Connection,
        torrent_hash: &str,
    ) -> Result<Option<TorrentStatus>, StoreError> {
        let result = conn.query_row(
            "SELECT status FROM pending_torrents WHERE torrent_hash = ?1",
            params![torrent_hash],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => TorrentStatus::parse(&value).map(Some).ok_or_else(|| {
                StoreError::Database(format!(
                    "unknown status '{}' stored for {}",
                    value, torrent_hash
                ))
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn row_to_pending(row: &rusqlite::Row) -> rusqlite::Result<PendingTorrent> {
        let status_str: String = row.get(6)?;
        let status = TorrentStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown status '{}'", status_str).into(),
            )
        })?;

        let retry_count: i64 = row.get(7)?;
        let max_retries: i64 = row.get(8)?;
        let filter_result_json: Option<String> = row.get(9)?;
        let added_at_str: String = row.get(11)?;
        let last_check_str: Option<String> = row.get(12)?;
        let completed_str: Option<String> = row.get(13)?;
        let file_count: Option<i64> = row.get(14)?;
        let total_size: Option<i64> = row.get(15)?;
        let filtered_count: Option<i64> = row.get(16)?;
        let updated_at_str: String = row.get(19)?;

        Ok(PendingTorrent {
            torrent_hash: row.get(0)?,
            magnet_link: row.get(1)?,
            save_path: row.get(2)?,
            category: row.get(3)?,
            video_number: row.get(4)?,
            source_tag: row.get(5)?,
            status,
            retry_count: retry_count.max(0) as u32,
            max_retries: max_retries.max(0) as u32,
            filter_result: filter_result_json.and_then(|json| serde_json::from_str(&json).ok()),
            error_message: row.get(10)?,
            added_at: parse_timestamp(&added_at_str),
            last_check_at: parse_optional_timestamp(last_check_str),
            completed_at: parse_optional_timestamp(completed_str),
            file_count: file_count.map(|c| c.max(0) as u32),
            total_size_bytes: total_size.map(|s| s.max(0) as u64),
            filtered_file_count: filtered_count.map(|c| c.max(0) as u32),
            created_by: row.get(17)?,
            updated_by: row.get(18)?,
            updated_at: parse_timestamp(&updated_at_str),
        })
    }
}

impl PendingTorrentStore for SqlitePendingStore {
    fn create(
        &self,
        request: NewPendingTorrent,
        ctx: &AuditContext,
    ) -> Result<PendingTorrent, StoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let result = conn.execute(
            "INSERT INTO pending_torrents (
                torrent_hash, magnet_link, save_path, category, video_number, source_tag,
                status, retry_count, max_retries, added_at, created_by, updated_by, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10, ?11, ?12)",
            params![
                request.torrent_hash,
                request.magnet_link,
                request.save_path,
                request.category,
                request.video_number,
                request.source_tag,
                TorrentStatus::WaitingMetadata.as_str(),
                request.max_retries as i64,
                now_str,
                ctx.actor,
                ctx.actor,
                now_str,
            ],
        );

        match result {
            Ok(_) => Ok(PendingTorrent {
                torrent_hash: request.torrent_hash,
                magnet_link: request.magnet_link,
                save_path: request.save_path,
                category: request.category,
                video_number: request.video_number,
                source_tag: request.source_tag,
                status: TorrentStatus::WaitingMetadata,
                retry_count: 0,
                max_retries: request.max_retries,
                filter_result: None,
                error_message: None,
                added_at: now,
                last_check_at: None,
                completed_at: None,
                file_count: None,
                total_size_bytes: None,
                filtered_file_count: None,
                created_by: ctx.actor.clone(),
                updated_by: ctx.actor.clone(),
                updated_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate(request.torrent_hash))
            }
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn get(&self, torrent_hash: &str) -> Result<Option<PendingTorrent>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_record(&conn, torrent_hash)
    }

    fn list_by_status(&self, status: TorrentStatus) -> Result<Vec<PendingTorrent>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT {} FROM pending_torrents WHERE status = ?1 ORDER BY added_at ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn
            .prepare(&query)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![status.as_str()], Self::row_to_pending)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn count_by_status(&self, status: TorrentStatus) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM pending_torrents WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn transition(
        &self,
        torrent_hash: &str,
        expected: TorrentStatus,
        new_status: TorrentStatus,
        fields: TransitionFields,
        ctx: &AuditContext,
    ) -> Result<PendingTorrent, StoreError> {
        if !expected.can_transition_to(new_status) {
            return Err(StoreError::InvalidTransition {
                from: expected,
                to: new_status,
            });
        }

        let filter_result_json = fields
            .filter_result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = self.conn.lock().unwrap();
        let now_str = Utc::now().to_rfc3339();

        // The WHERE clause is the compare-and-swap: zero rows updated means
        // the record moved (or vanished) since the caller read it.
        let rows = conn
            .execute(
                "UPDATE pending_torrents SET
                    status = ?1,
                    file_count = COALESCE(?2, file_count),
                    total_size_bytes = COALESCE(?3, total_size_bytes),
                    filtered_file_count = COALESCE(?4, filtered_file_count),
                    filter_result = COALESCE(?5, filter_result),
                    error_message = COALESCE(?6, error_message),
                    completed_at = COALESCE(?7, completed_at),
                    last_check_at = ?8,
                    updated_by = ?9,
                    updated_at = ?10
                WHERE torrent_hash = ?11 AND status = ?12",
                params![
                    new_status.as_str(),
                    fields.file_count.map(|c| c as i64),
                    fields.total_size_bytes.map(|s| s as i64),
                    fields.filtered_file_count.map(|c| c as i64),
                    filter_result_json,
                    fields.error_message,
                    fields.completed_at.map(|t| t.to_rfc3339()),
                    now_str,
                    ctx.actor,
                    now_str,
                    torrent_hash,
                    expected.as_str(),
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if rows == 0 {
            return match Self::current_status(&conn, torrent_hash)? {
                Some(actual) => Err(StoreError::Conflict {
                    hash: torrent_hash.to_string(),
                    expected,
                    actual,
                }),
                None => Err(StoreError::NotFound(torrent_hash.to_string())),
            };
        }

        Self::fetch_record(&conn, torrent_hash)?.ok_or_else(|| {
            StoreError::Database(format!("record {} missing after update", torrent_hash))
        })
    }

    fn increment_retry(&self, torrent_hash: &str, ctx: &AuditContext) -> Result<u32, StoreError> {
        let conn = self.conn.lock().unwrap();
        let now_str = Utc::now().to_rfc3339();

        let rows = conn
            .execute(
                "UPDATE pending_torrents SET
                    retry_count = retry_count + 1,
                    last_check_at = ?1,
                    updated_by = ?2,
                    updated_at = ?3
                WHERE torrent_hash = ?4",
                params![now_str, ctx.actor, now_str, torrent_hash],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(StoreError::NotFound(torrent_hash.to_string()));
        }

        conn.query_row(
            "SELECT retry_count FROM pending_torrents WHERE torrent_hash = ?1",
            params![torrent_hash],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count.max(0) as u32)
        .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_optional_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::filter::{FileDescriptor, FilterResult};

    fn ctx() -> AuditContext {
        AuditContext::new("test")
    }

    fn request(hash: &str) -> NewPendingTorrent {
        NewPendingTorrent {
            torrent_hash: hash.to_string(),
            magnet_link: format!("magnet:?xt=urn:btih:{}", hash),
            save_path: "/downloads".to_string(),
            category: Some("movies".to_string()),
            video_number: Some("ABC-123".to_string()),
            source_tag: "manual".to_string(),
            max_retries: 30,
        }
    }

    fn sample_filter_result() -> FilterResult {
        FilterResult {
            kept_files: vec![FileDescriptor::new("movie.mkv", 800 * 1024 * 1024, "movie.mkv")],
            kept_count: 1,
            total_size_bytes: 800 * 1024 * 1024,
            passed: true,
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SqlitePendingStore::in_memory().unwrap();
        let created = store.create(request("hash-1"), &ctx()).unwrap();

        assert_eq!(created.status, TorrentStatus::WaitingMetadata);
        assert_eq!(created.retry_count, 0);
        assert_eq!(created.max_retries, 30);
        assert_eq!(created.created_by, "test");

        let fetched = store.get("hash-1").unwrap().unwrap();
        assert_eq!(fetched.torrent_hash, "hash-1");
        assert_eq!(fetched.magnet_link, "magnet:?xt=urn:btih:hash-1");
        assert_eq!(fetched.save_path, "/downloads");
        assert_eq!(fetched.category.as_deref(), Some("movies"));
        assert_eq!(fetched.video_number.as_deref(), Some("ABC-123"));
        assert_eq!(fetched.source_tag, "manual");
        assert_eq!(fetched.status, TorrentStatus::WaitingMetadata);
        assert!(fetched.filter_result.is_none());
        assert!(fetched.last_check_at.is_none());
        assert!(fetched.completed_at.is_none());
    }

    #[test]
    fn test_create_duplicate_hash_rejected() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();

        let mut second = request("hash-1");
        second.source_tag = "other".to_string();
        let err = store.create(second, &ctx()).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref h) if h == "hash-1"));

        // The stored record is untouched
        let stored = store.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.source_tag, "manual");
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = SqlitePendingStore::in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_and_count_by_status() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();
        store.create(request("hash-2"), &ctx()).unwrap();
        store.create(request("hash-3"), &ctx()).unwrap();

        store
            .transition(
                "hash-2",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap();

        let waiting = store
            .list_by_status(TorrentStatus::WaitingMetadata)
            .unwrap();
        assert_eq!(waiting.len(), 2);
        let ready = store.list_by_status(TorrentStatus::MetadataReady).unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].torrent_hash, "hash-2");

        assert_eq!(
            store.count_by_status(TorrentStatus::WaitingMetadata).unwrap(),
            2
        );
        assert_eq!(
            store.count_by_status(TorrentStatus::Completed).unwrap(),
            0
        );
    }

    #[test]
    fn test_transition_writes_fields() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();

        let updated = store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new()
                    .with_file_count(3)
                    .with_total_size_bytes(4096),
                &AuditContext::new("watcher"),
            )
            .unwrap();

        assert_eq!(updated.status, TorrentStatus::MetadataReady);
        assert_eq!(updated.file_count, Some(3));
        assert_eq!(updated.total_size_bytes, Some(4096));
        assert!(updated.last_check_at.is_some());
        assert_eq!(updated.updated_by, "watcher");
        assert_eq!(updated.created_by, "test");
    }

    #[test]
    fn test_transition_keeps_absent_fields() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();

        store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new().with_file_count(3),
                &ctx(),
            )
            .unwrap();
        let after = store
            .transition(
                "hash-1",
                TorrentStatus::MetadataReady,
                TorrentStatus::Filtering,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap();

        assert_eq!(after.file_count, Some(3));
    }

    #[test]
    fn test_transition_conflict_reports_actual_status() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();

        store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap();

        let err = store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap_err();

        match err {
            StoreError::Conflict {
                hash,
                expected,
                actual,
            } => {
                assert_eq!(hash, "hash-1");
                assert_eq!(expected, TorrentStatus::WaitingMetadata);
                assert_eq!(actual, TorrentStatus::MetadataReady);
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_transition_missing_record() {
        let store = SqlitePendingStore::in_memory().unwrap();
        let err = store
            .transition(
                "nope",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_transition_illegal_edge_rejected() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();

        let err = store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::Completed,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        // Nothing was written
        let stored = store.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.status, TorrentStatus::WaitingMetadata);
    }

    #[test]
    fn test_terminal_records_cannot_move() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();
        store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::Failed,
                TransitionFields::new().with_error_message("gone"),
                &ctx(),
            )
            .unwrap();

        let err = store
            .transition(
                "hash-1",
                TorrentStatus::Failed,
                TorrentStatus::TimedOut,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_completed_record_round_trips_filter_result() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();
        store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::MetadataReady,
                TransitionFields::new().with_file_count(1),
                &ctx(),
            )
            .unwrap();
        store
            .transition(
                "hash-1",
                TorrentStatus::MetadataReady,
                TorrentStatus::Filtering,
                TransitionFields::new(),
                &ctx(),
            )
            .unwrap();

        let result = sample_filter_result();
        let completed_at = Utc::now();
        store
            .transition(
                "hash-1",
                TorrentStatus::Filtering,
                TorrentStatus::Completed,
                TransitionFields::new()
                    .with_filter_result(result.clone())
                    .with_filtered_file_count(result.kept_count)
                    .with_completed_at(completed_at),
                &ctx(),
            )
            .unwrap();

        let stored = store.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.status, TorrentStatus::Completed);
        assert_eq!(stored.filter_result, Some(result));
        assert_eq!(stored.filtered_file_count, Some(1));
        assert!(stored.completed_at.is_some());
    }

    #[test]
    fn test_failed_record_carries_message_and_completed_at() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();
        store
            .transition(
                "hash-1",
                TorrentStatus::WaitingMetadata,
                TorrentStatus::Failed,
                TransitionFields::new()
                    .with_error_message("torrent not found: hash-1")
                    .with_completed_at(Utc::now()),
                &ctx(),
            )
            .unwrap();

        let stored = store.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.status, TorrentStatus::Failed);
        assert_eq!(
            stored.error_message.as_deref(),
            Some("torrent not found: hash-1")
        );
        assert!(stored.completed_at.is_some());
        assert!(stored.filter_result.is_none());
    }

    #[test]
    fn test_increment_retry() {
        let store = SqlitePendingStore::in_memory().unwrap();
        store.create(request("hash-1"), &ctx()).unwrap();

        assert_eq!(store.increment_retry("hash-1", &ctx()).unwrap(), 1);
        assert_eq!(store.increment_retry("hash-1", &ctx()).unwrap(), 2);
        assert_eq!(store.increment_retry("hash-1", &ctx()).unwrap(), 3);

        let stored = store.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.retry_count, 3);
        assert!(stored.last_check_at.is_some());
        assert_eq!(stored.status, TorrentStatus::WaitingMetadata);
    }

    #[test]
    fn test_increment_retry_missing_record() {
        let store = SqlitePendingStore::in_memory().unwrap();
        let err = store.increment_retry("nope", &ctx()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_concurrent_transition_single_winner() {
        let store = Arc::new(SqlitePendingStore::in_memory().unwrap());
        store.create(request("hash-1"), &ctx()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store.transition(
                    "hash-1",
                    TorrentStatus::WaitingMetadata,
                    TorrentStatus::MetadataReady,
                    TransitionFields::new(),
                    &AuditContext::new("racer"),
                )
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "exactly one writer must win the CAS");

        let loser = results.into_iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(loser.unwrap_err(), StoreError::Conflict { .. }));

        let stored = store.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.status, TorrentStatus::MetadataReady);
    }

    #[test]
    fn test_file_based_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pending.db");

        {
            let store = SqlitePendingStore::new(&db_path).unwrap();
            store.create(request("hash-1"), &ctx()).unwrap();
            store
                .transition(
                    "hash-1",
                    TorrentStatus::WaitingMetadata,
                    TorrentStatus::MetadataReady,
                    TransitionFields::new().with_file_count(2),
                    &ctx(),
                )
                .unwrap();
        }

        let reopened = SqlitePendingStore::new(&db_path).unwrap();
        let stored = reopened.get("hash-1").unwrap().unwrap();
        assert_eq!(stored.status, TorrentStatus::MetadataReady);
        assert_eq!(stored.file_count, Some(2));
    }
}
