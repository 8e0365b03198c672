//! Storage layer for timetrack.
//!
//! Provides persistence for time entries and directory mappings using
//! `rusqlite`, and implements [`EntryStore`] for the timer.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Each CLI invocation opens its own connection; separate processes (for
//! example the alert watcher) are serialized by SQLite's file locking. A
//! writer that cannot get the lock within [`BUSY_TIMEOUT`] fails with
//! [`DbError::Locked`] rather than retrying.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with the UTC offset they
//! were recorded at and whole-second precision (e.g. `2025-01-15T10:30:00+01:00`).
//! Because offsets can differ between rows, ordering and date filtering are
//! done on parsed values rather than on the raw text.
//!
//! ## Tags
//!
//! The `tags` column stores a JSON array of strings. `NULL` reads as no tags.
//!
//! ## Legacy Columns
//!
//! `paused_duration` exists for compatibility with older databases and is
//! not written.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};
use thiserror::Error;

use timetrack_core::{
    DetectionMethod, DirectoryMapping, EntryPatch, EntryStatus, EntryStore, FilterSet, NewEntry,
    TimeEntry, Timestamp,
};

/// How long a statement waits for another process's lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
    /// The database is locked by another process.
    #[error("database is locked by another process: {0}")]
    Locked(#[source] rusqlite::Error),
    /// Failed to encode or decode the tags column.
    #[error("invalid tags JSON: {0}")]
    Tags(#[from] serde_json::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in row {id}: {value}")]
    TimestampParse {
        id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row holds a value the domain types reject.
    #[error("invalid data in row {id}: {message}")]
    InvalidRow { id: i64, message: String },
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Locked(err),
            _ => Self::Sqlite(err),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

const ENTRY_COLUMNS: &str = "id, project, sub_project, tags, start_time, end_time, duration, \
     directory, status, expected_duration, created_at";

const MAPPING_COLUMNS: &str =
    "id, directory_path, project_name, auto_detected, detection_method, created_at";

/// A `time_entries` row before parsing into domain types.
#[derive(Debug)]
struct EntryRow {
    id: i64,
    project: String,
    sub_project: Option<String>,
    tags: Option<String>,
    start_time: String,
    end_time: Option<String>,
    duration: Option<i64>,
    directory: String,
    status: String,
    expected_duration: Option<i64>,
    created_at: String,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project: row.get(1)?,
            sub_project: row.get(2)?,
            tags: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            duration: row.get(6)?,
            directory: row.get(7)?,
            status: row.get(8)?,
            expected_duration: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_entry(self) -> Result<TimeEntry, DbError> {
        let id = self.id;
        let tags = match self.tags.as_deref() {
            Some(json) => serde_json::from_str(json)?,
            None => Vec::new(),
        };
        let status = self.status.parse::<EntryStatus>().map_err(|err| DbError::InvalidRow {
            id,
            message: err.to_string(),
        })?;
        Ok(TimeEntry {
            id,
            project: self.project,
            sub_project: self.sub_project,
            tags,
            start_time: parse_timestamp(&self.start_time, id)?,
            end_time: self
                .end_time
                .as_deref()
                .map(|value| parse_timestamp(value, id))
                .transpose()?,
            duration: self.duration,
            directory: self.directory,
            status,
            expected_duration: self.expected_duration,
            created_at: parse_timestamp(&self.created_at, id)?,
        })
    }
}

/// A `directory_mappings` row before parsing into domain types.
#[derive(Debug)]
struct MappingRow {
    id: i64,
    directory_path: String,
    project_name: String,
    auto_detected: bool,
    detection_method: Option<String>,
    created_at: String,
}

impl MappingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            directory_path: row.get(1)?,
            project_name: row.get(2)?,
            auto_detected: row.get(3)?,
            detection_method: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_mapping(self) -> Result<DirectoryMapping, DbError> {
        // Mappings written without a method predate detection tracking.
        let detection_method = match self.detection_method.as_deref() {
            Some(method) => method
                .parse::<DetectionMethod>()
                .map_err(|err| DbError::InvalidRow {
                    id: self.id,
                    message: err.to_string(),
                })?,
            None if self.auto_detected => DetectionMethod::DirectoryName,
            None => DetectionMethod::Manual,
        };
        Ok(DirectoryMapping {
            directory_path: self.directory_path,
            project_name: self.project_name,
            auto_detected: self.auto_detected,
            detection_method,
            created_at: parse_timestamp(&self.created_at, self.id)?,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch(
            "
            -- One row per timer session.
            -- status: 'active' | 'paused' | 'completed'
            -- duration: banked seconds, NULL until the first pause or stop
            CREATE TABLE IF NOT EXISTS time_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project TEXT NOT NULL,
                sub_project TEXT,
                tags TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration INTEGER,
                directory TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                paused_duration INTEGER DEFAULT 0,
                expected_duration INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_status ON time_entries(status);
            CREATE INDEX IF NOT EXISTS idx_time_entries_project ON time_entries(project);

            CREATE TABLE IF NOT EXISTS directory_mappings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                directory_path TEXT UNIQUE NOT NULL,
                project_name TEXT NOT NULL,
                auto_detected INTEGER NOT NULL DEFAULT 1,
                detection_method TEXT,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn query_entry(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<TimeEntry>, DbError> {
        let row = self
            .conn
            .query_row(sql, params, EntryRow::from_row)
            .optional()?;
        row.map(EntryRow::into_entry).transpose()
    }

    fn entry_by_status(&self, status: EntryStatus) -> Result<Option<TimeEntry>, DbError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE status = ? ORDER BY id DESC LIMIT 1"
        );
        self.query_entry(&sql, [status.as_str()])
    }
}

impl EntryStore for Database {
    type Error = DbError;

    fn create_entry(&mut self, entry: &NewEntry) -> Result<i64, DbError> {
        let tags = serde_json::to_string(&entry.tags)?;
        let start_time = format_timestamp(entry.start_time);
        self.conn.execute(
            "
            INSERT INTO time_entries
            (project, sub_project, tags, start_time, directory, status, expected_duration, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                entry.project,
                entry.sub_project,
                tags,
                start_time,
                entry.directory,
                EntryStatus::Active.as_str(),
                entry.expected_duration,
                start_time,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_by_id(&self, id: i64) -> Result<Option<TimeEntry>, DbError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?");
        self.query_entry(&sql, [id])
    }

    fn get_active(&self) -> Result<Option<TimeEntry>, DbError> {
        self.entry_by_status(EntryStatus::Active)
    }

    fn get_paused(&self) -> Result<Option<TimeEntry>, DbError> {
        self.entry_by_status(EntryStatus::Paused)
    }

    fn update(&mut self, id: i64, patch: &EntryPatch) -> Result<bool, DbError> {
        let columns = patch_columns(patch)?;
        if columns.is_empty() {
            return Ok(false);
        }
        let assignments: Vec<String> = columns
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect();
        let sql = format!(
            "UPDATE time_entries SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let values = columns
            .into_iter()
            .map(|(_, value)| value)
            .chain(std::iter::once(Value::Integer(id)));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(changed > 0)
    }

    fn delete_entry(&mut self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM time_entries WHERE id = ?", [id])?;
        Ok(changed > 0)
    }

    fn find_with_filters(&self, filters: &FilterSet) -> Result<Vec<TimeEntry>, DbError> {
        let mut sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE status = ? AND end_time IS NOT NULL"
        );
        let mut values = vec![Value::Text(EntryStatus::Completed.as_str().to_string())];
        if !filters.projects.is_empty() {
            let placeholders = vec!["?"; filters.projects.len()].join(", ");
            sql.push_str(&format!(" AND project IN ({placeholders})"));
            values.extend(filters.projects.iter().cloned().map(Value::Text));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), EntryRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            let entry = row?.into_entry()?;
            // Tag and date predicates need parsed values.
            if filters.matches(&entry) {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    fn save_directory_mapping(&mut self, mapping: &DirectoryMapping) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO directory_mappings
            (directory_path, project_name, auto_detected, detection_method, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(directory_path) DO UPDATE SET
                project_name = excluded.project_name,
                auto_detected = excluded.auto_detected,
                detection_method = excluded.detection_method,
                created_at = excluded.created_at
            ",
            params![
                mapping.directory_path,
                mapping.project_name,
                mapping.auto_detected,
                mapping.detection_method.as_str(),
                format_timestamp(mapping.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_directory_mapping(&self, path: &Path) -> Result<Option<DirectoryMapping>, DbError> {
        let sql =
            format!("SELECT {MAPPING_COLUMNS} FROM directory_mappings WHERE directory_path = ?");
        let path = path.to_string_lossy();
        let row = self
            .conn
            .query_row(&sql, [&*path], MappingRow::from_row)
            .optional()?;
        row.map(MappingRow::into_mapping).transpose()
    }

    fn list_directory_mappings(&self) -> Result<Vec<DirectoryMapping>, DbError> {
        let sql = format!("SELECT {MAPPING_COLUMNS} FROM directory_mappings ORDER BY id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], MappingRow::from_row)?;
        let mut mappings = Vec::new();
        for row in rows {
            mappings.push(row?.into_mapping()?);
        }
        // Stable, so equal timestamps keep newest-row-first order.
        mappings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mappings)
    }
}

/// Column assignments for the fields set in `patch`.
fn patch_columns(patch: &EntryPatch) -> Result<Vec<(&'static str, Value)>, DbError> {
    let mut columns = Vec::new();
    if let Some(project) = &patch.project {
        columns.push(("project", Value::Text(project.clone())));
    }
    if let Some(sub_project) = &patch.sub_project {
        columns.push(("sub_project", sub_project.clone().map_or(Value::Null, Value::Text)));
    }
    if let Some(tags) = &patch.tags {
        columns.push(("tags", Value::Text(serde_json::to_string(tags)?)));
    }
    if let Some(start_time) = patch.start_time {
        columns.push(("start_time", Value::Text(format_timestamp(start_time))));
    }
    if let Some(end_time) = patch.end_time {
        columns.push((
            "end_time",
            end_time.map_or(Value::Null, |t| Value::Text(format_timestamp(t))),
        ));
    }
    if let Some(duration) = patch.duration {
        columns.push(("duration", duration.map_or(Value::Null, Value::Integer)));
    }
    if let Some(status) = patch.status {
        columns.push(("status", Value::Text(status.as_str().to_string())));
    }
    Ok(columns)
}

fn parse_timestamp(value: &str, id: i64) -> Result<Timestamp, DbError> {
    DateTime::parse_from_rfc3339(value).map_err(|source| DbError::TimestampParse {
        id,
        value: value.to_string(),
        source,
    })
}

fn format_timestamp(timestamp: Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::NaiveDate;

    fn ts(value: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    fn new_entry(project: &str, tags: &[&str], start: &str) -> NewEntry {
        NewEntry {
            project: project.to_string(),
            sub_project: None,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            directory: "/work/api".to_string(),
            expected_duration: None,
            start_time: ts(start),
        }
    }

    fn completed_patch(end: &str, duration: i64) -> EntryPatch {
        EntryPatch {
            status: Some(EntryStatus::Completed),
            end_time: Some(Some(ts(end))),
            duration: Some(Some(duration)),
            ..EntryPatch::default()
        }
    }

    fn insert_completed(db: &mut Database, project: &str, tags: &[&str], start: &str) -> i64 {
        let id = db.create_entry(&new_entry(project, tags, start)).unwrap();
        let end = (ts(start) + chrono::Duration::seconds(60)).to_rfc3339();
        assert!(db.update(id, &completed_patch(&end, 60)).unwrap());
        id
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "time_entries"),
            vec![
                "id",
                "project",
                "sub_project",
                "tags",
                "start_time",
                "end_time",
                "duration",
                "directory",
                "status",
                "paused_duration",
                "expected_duration",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "directory_mappings"),
            vec![
                "id",
                "directory_path",
                "project_name",
                "auto_detected",
                "detection_method",
                "created_at",
            ]
        );

        let entry_indexes = index_names(&db.conn, "time_entries");
        assert!(entry_indexes.contains("idx_time_entries_status"));
        assert!(entry_indexes.contains("idx_time_entries_project"));
    }

    #[test]
    fn init_is_idempotent_on_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("timetrack.db");
        let mut db = Database::open(&path).unwrap();
        let id = db
            .create_entry(&new_entry("api", &[], "2025-01-29T09:00:00+01:00"))
            .unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_by_id(id).unwrap().unwrap().project, "api");
    }

    #[test]
    fn create_entry_starts_active_without_duration() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_entry(&NewEntry {
                sub_project: Some("auth".to_string()),
                expected_duration: Some(3600),
                ..new_entry("api", &["urgent", "in-work"], "2025-01-29T09:00:00+01:00")
            })
            .unwrap();

        let entry = db.get_by_id(id).unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.project, "api");
        assert_eq!(entry.sub_project.as_deref(), Some("auth"));
        assert_eq!(entry.tags, vec!["urgent".to_string(), "in-work".to_string()]);
        assert_eq!(entry.start_time, ts("2025-01-29T09:00:00+01:00"));
        assert_eq!(entry.created_at, entry.start_time);
        assert_eq!(entry.end_time, None);
        assert_eq!(entry.duration, None);
        assert_eq!(entry.status, EntryStatus::Active);
        assert_eq!(entry.expected_duration, Some(3600));

        assert_eq!(db.get_active().unwrap(), Some(entry));
        assert_eq!(db.get_paused().unwrap(), None);
    }

    #[test]
    fn timestamps_keep_their_offset() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_entry(&new_entry("api", &[], "2025-01-29T23:30:00-05:00"))
            .unwrap();
        let stored: String = db
            .conn
            .query_row("SELECT start_time FROM time_entries WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored, "2025-01-29T23:30:00-05:00");

        let entry = db.get_by_id(id).unwrap().unwrap();
        assert_eq!(entry.start_date(), NaiveDate::from_ymd_opt(2025, 1, 29).unwrap());
    }

    #[test]
    fn get_by_status_finds_paused_entries() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_entry(&new_entry("api", &[], "2025-01-29T09:00:00Z"))
            .unwrap();
        let pause = EntryPatch {
            status: Some(EntryStatus::Paused),
            duration: Some(Some(100)),
            ..EntryPatch::default()
        };
        assert!(db.update(id, &pause).unwrap());

        assert_eq!(db.get_active().unwrap(), None);
        let paused = db.get_paused().unwrap().unwrap();
        assert_eq!(paused.id, id);
        assert_eq!(paused.duration, Some(100));
    }

    #[test]
    fn update_reports_missing_rows_and_empty_patches() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(!db.update(99, &completed_patch("2025-01-29T10:00:00Z", 5)).unwrap());

        let id = db
            .create_entry(&new_entry("api", &[], "2025-01-29T09:00:00Z"))
            .unwrap();
        assert!(!db.update(id, &EntryPatch::default()).unwrap());
    }

    #[test]
    fn update_writes_every_patch_field() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_entry(&NewEntry {
                sub_project: Some("auth".to_string()),
                ..new_entry("api", &["in-work"], "2025-01-29T09:00:00Z")
            })
            .unwrap();

        let patch = EntryPatch {
            project: Some("web".to_string()),
            sub_project: Some(None),
            tags: Some(vec!["review".to_string()]),
            start_time: Some(ts("2025-01-29T09:30:00Z")),
            end_time: Some(Some(ts("2025-01-29T10:00:00Z"))),
            duration: Some(Some(1800)),
            status: Some(EntryStatus::Completed),
        };
        assert!(db.update(id, &patch).unwrap());

        let entry = db.get_by_id(id).unwrap().unwrap();
        assert_eq!(entry.project, "web");
        assert_eq!(entry.sub_project, None);
        assert_eq!(entry.tags, vec!["review".to_string()]);
        assert_eq!(entry.start_time, ts("2025-01-29T09:30:00Z"));
        assert_eq!(entry.end_time, Some(ts("2025-01-29T10:00:00Z")));
        assert_eq!(entry.duration, Some(1800));
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.directory, "/work/api");
    }

    #[test]
    fn find_with_filters_returns_completed_newest_first() {
        let mut db = Database::open_in_memory().unwrap();
        let older = insert_completed(&mut db, "api", &["a"], "2025-01-27T09:00:00Z");
        let newer = insert_completed(&mut db, "web", &["a", "b"], "2025-01-29T09:00:00Z");
        db.create_entry(&new_entry("api", &["a"], "2025-01-29T12:00:00Z"))
            .unwrap();

        let found = db.find_with_filters(&FilterSet::default()).unwrap();
        let ids: Vec<i64> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newer, older]);
        assert!(found.iter().all(|e| e.status == EntryStatus::Completed));
    }

    #[test]
    fn find_with_filters_applies_projects_tags_and_dates() {
        let mut db = Database::open_in_memory().unwrap();
        let api = insert_completed(&mut db, "api", &["a", "b"], "2025-01-27T09:00:00Z");
        let web = insert_completed(&mut db, "web", &["a"], "2025-01-28T09:00:00Z");
        let ops = insert_completed(&mut db, "ops", &["b"], "2025-01-29T09:00:00Z");

        let by_project = FilterSet {
            projects: vec!["api".to_string(), "ops".to_string()],
            ..FilterSet::default()
        };
        let ids: Vec<i64> = db
            .find_with_filters(&by_project)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![ops, api]);

        let by_tags = FilterSet {
            tags: vec!["a".to_string(), "b".to_string()],
            ..FilterSet::default()
        };
        let ids: Vec<i64> = db
            .find_with_filters(&by_tags)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![api]);

        let by_date = FilterSet {
            from_date: NaiveDate::from_ymd_opt(2025, 1, 28),
            to_date: NaiveDate::from_ymd_opt(2025, 1, 28),
            ..FilterSet::default()
        };
        let ids: Vec<i64> = db
            .find_with_filters(&by_date)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![web]);
    }

    #[test]
    fn tag_filter_matches_whole_tags_only() {
        let mut db = Database::open_in_memory().unwrap();
        insert_completed(&mut db, "api", &["frontend"], "2025-01-27T09:00:00Z");

        let filters = FilterSet {
            tags: vec!["front".to_string()],
            ..FilterSet::default()
        };
        assert!(db.find_with_filters(&filters).unwrap().is_empty());
    }

    #[test]
    fn delete_entry_removes_row() {
        let mut db = Database::open_in_memory().unwrap();
        let id = insert_completed(&mut db, "api", &[], "2025-01-27T09:00:00Z");
        assert!(db.delete_entry(id).unwrap());
        assert!(!db.delete_entry(id).unwrap());
        assert_eq!(db.get_by_id(id).unwrap(), None);
    }

    #[test]
    fn directory_mapping_upsert_replaces_by_path() {
        let mut db = Database::open_in_memory().unwrap();
        let path = Path::new("/work/api");
        assert_eq!(db.get_directory_mapping(path).unwrap(), None);

        let detected = DirectoryMapping {
            directory_path: "/work/api".to_string(),
            project_name: "api".to_string(),
            auto_detected: true,
            detection_method: DetectionMethod::GitRepo,
            created_at: ts("2025-01-27T09:00:00Z"),
        };
        db.save_directory_mapping(&detected).unwrap();
        assert_eq!(db.get_directory_mapping(path).unwrap(), Some(detected));

        let manual = DirectoryMapping {
            directory_path: "/work/api".to_string(),
            project_name: "billing".to_string(),
            auto_detected: false,
            detection_method: DetectionMethod::Manual,
            created_at: ts("2025-01-28T09:00:00Z"),
        };
        db.save_directory_mapping(&manual).unwrap();
        assert_eq!(db.get_directory_mapping(path).unwrap(), Some(manual.clone()));

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM directory_mappings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.list_directory_mappings().unwrap(), vec![manual]);
    }

    #[test]
    fn list_directory_mappings_most_recent_first() {
        let mut db = Database::open_in_memory().unwrap();
        for (path, at) in [
            ("/work/a", "2025-01-27T09:00:00Z"),
            ("/work/b", "2025-01-29T09:00:00Z"),
            ("/work/c", "2025-01-28T09:00:00Z"),
        ] {
            db.save_directory_mapping(&DirectoryMapping {
                directory_path: path.to_string(),
                project_name: "p".to_string(),
                auto_detected: true,
                detection_method: DetectionMethod::DirectoryName,
                created_at: ts(at),
            })
            .unwrap();
        }
        let paths: Vec<String> = db
            .list_directory_mappings()
            .unwrap()
            .into_iter()
            .map(|m| m.directory_path)
            .collect();
        assert_eq!(paths, vec!["/work/b", "/work/c", "/work/a"]);
    }

    #[test]
    fn legacy_mapping_without_method_reads_back() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO directory_mappings (directory_path, project_name, auto_detected, created_at)
                 VALUES ('/old', 'legacy', 0, '2024-06-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        let mapping = db.get_directory_mapping(Path::new("/old")).unwrap().unwrap();
        assert_eq!(mapping.detection_method, DetectionMethod::Manual);
    }

    #[test]
    fn corrupt_mapping_reports_its_row_id() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO directory_mappings (directory_path, project_name, detection_method, created_at)
                 VALUES ('/a', 'alpha', 'manual', '2024-06-01T00:00:00+00:00'),
                        ('/b', 'beta', 'guesswork', '2024-06-01T00:00:00+00:00'),
                        ('/c', 'gamma', 'manual', 'last week')",
                [],
            )
            .unwrap();

        assert!(matches!(
            db.get_directory_mapping(Path::new("/b")),
            Err(DbError::InvalidRow { id: 2, .. })
        ));
        assert!(matches!(
            db.get_directory_mapping(Path::new("/c")),
            Err(DbError::TimestampParse { id: 3, .. })
        ));
    }

    #[test]
    fn corrupt_rows_surface_as_errors() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_entry(&new_entry("api", &[], "2025-01-29T09:00:00Z"))
            .unwrap();

        db.conn
            .execute("UPDATE time_entries SET status = 'running' WHERE id = ?", [id])
            .unwrap();
        assert!(matches!(db.get_by_id(id), Err(DbError::InvalidRow { .. })));

        db.conn
            .execute(
                "UPDATE time_entries SET status = 'active', start_time = 'yesterday' WHERE id = ?",
                [id],
            )
            .unwrap();
        assert!(matches!(
            db.get_active(),
            Err(DbError::TimestampParse { .. })
        ));
    }

    #[test]
    fn null_tags_read_as_empty() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_entry(&new_entry("api", &["x"], "2025-01-29T09:00:00Z"))
            .unwrap();
        db.conn
            .execute("UPDATE time_entries SET tags = NULL WHERE id = ?", [id])
            .unwrap();
        assert!(db.get_by_id(id).unwrap().unwrap().tags.is_empty());
    }

    #[test]
    fn busy_errors_classify_as_locked() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DbError::from(busy), DbError::Locked(_)));

        let other = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(DbError::from(other), DbError::Sqlite(_)));
    }
}
