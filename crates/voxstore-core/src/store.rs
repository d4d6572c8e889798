//! SQLite persistence for timbres and voice clones
//!
//! Schema:
//! - timbre: one row per selectable voice, keyed by voice id
//! - voice_clone: rows owned by the cloning pipeline, read here for listings
//! - Indexes: model scans, (model, voice_code) lookup, clone owner scans
//!
//! Timestamps are stored as RFC 3339 text. One connection behind a mutex
//! serves every query; statements are short, so contention stays negligible
//! at catalog volumes.

use crate::error::CoreError;
use crate::models::{
    PageQuery, TimbreFilter, TimbreRecord, TrainStatus, UserId, VoiceCloneRecord, VoiceId,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Durable store for the voice catalog (thread-safe)
pub struct VoiceStore {
    conn: Mutex<Connection>,

    /// Point reads served by the store. The cache-effectiveness counterpart
    /// to [`voxstore_cache::CacheStats`]: a healthy cache keeps this flat
    /// while hits climb.
    lookups: AtomicU64,

    /// In-memory stores skip WAL and the checkpoint on drop
    file_backed: bool,
}

impl VoiceStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CoreError::DataDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| CoreError::db("store open", e))?;

        // WAL keeps readers unblocked during writes
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CoreError::db("wal pragma", e))?;

        let store = Self::initialize(conn, true)?;
        debug!(path = %path.display(), "Voice store opened");
        Ok(store)
    }

    /// Open a transient in-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(|e| CoreError::db("store open", e))?;
        Self::initialize(conn, false)
    }

    /// Platform data directory location, e.g. `~/.local/share/voxstore/voices.db`.
    pub fn default_db_path() -> Result<PathBuf, CoreError> {
        dirs::data_dir()
            .map(|base| base.join("voxstore").join("voices.db"))
            .ok_or(CoreError::DataDirUnavailable)
    }

    fn initialize(conn: Connection, file_backed: bool) -> Result<Self, CoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS timbre (
                id TEXT PRIMARY KEY,
                tts_model_id TEXT NOT NULL,
                name TEXT NOT NULL,
                voice_code TEXT NOT NULL,
                languages TEXT,
                remark TEXT,
                sort INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS voice_clone (
                id TEXT PRIMARY KEY,
                tts_model_id TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                train_status INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_timbre_model ON timbre(tts_model_id);
            CREATE INDEX IF NOT EXISTS idx_timbre_voice_code ON timbre(tts_model_id, voice_code);
            CREATE INDEX IF NOT EXISTS idx_clone_owner ON voice_clone(tts_model_id, user_id, train_status);
            "#,
        )
        .map_err(|e| CoreError::db("schema init", e))?;

        Ok(Self {
            conn: Mutex::new(conn),
            lookups: AtomicU64::new(0),
            file_backed,
        })
    }

    // ===================
    // Timbre rows
    // ===================

    /// Insert a new timbre. Fails on duplicate id.
    pub fn insert(&self, record: &TimbreRecord) -> Result<(), CoreError> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO timbre
            (id, tts_model_id, name, voice_code, languages, remark, sort, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.tts_model_id,
                record.name,
                record.voice_code,
                record.languages,
                record.remark,
                record.sort,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| CoreError::db("timbre insert", e))?;

        debug!(id = %record.id, "Timbre inserted");
        Ok(())
    }

    /// Fetch one timbre by id.
    pub fn get(&self, id: &str) -> Result<Option<TimbreRecord>, CoreError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let conn = self.conn.lock();
        conn.query_row(
            r#"
            SELECT id, tts_model_id, name, voice_code, languages, remark, sort,
                   created_at, updated_at
            FROM timbre
            WHERE id = ?1
            "#,
            params![id],
            timbre_from_row,
        )
        .optional()
        .map_err(|e| CoreError::db("timbre get", e))
    }

    /// Overwrite the mutable fields of an existing timbre.
    ///
    /// Returns `false` when no row has the record's id. `created_at` is
    /// never touched.
    pub fn update(&self, record: &TimbreRecord) -> Result<bool, CoreError> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                r#"
                UPDATE timbre
                SET tts_model_id = ?2, name = ?3, voice_code = ?4, languages = ?5,
                    remark = ?6, sort = ?7, updated_at = ?8
                WHERE id = ?1
                "#,
                params![
                    record.id,
                    record.tts_model_id,
                    record.name,
                    record.voice_code,
                    record.languages,
                    record.remark,
                    record.sort,
                    record.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| CoreError::db("timbre update", e))?;

        debug!(id = %record.id, updated = rows > 0, "Timbre update");
        Ok(rows > 0)
    }

    /// Delete every listed id in one statement. Missing ids are skipped.
    ///
    /// Returns the number of rows actually removed.
    pub fn delete_many(&self, ids: &[VoiceId]) -> Result<usize, CoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM timbre WHERE id IN ({placeholders})");

        let conn = self.conn.lock();
        let rows = conn
            .execute(&sql, params_from_iter(ids.iter()))
            .map_err(|e| CoreError::db("timbre delete", e))?;

        debug!(requested = ids.len(), deleted = rows, "Timbre batch delete");
        Ok(rows)
    }

    /// One page of timbres for a model, plus the total match count.
    ///
    /// Ordering is `(sort, id)` ascending so pages stay stable across
    /// requests. The optional name filter is a substring match with LIKE
    /// metacharacters escaped.
    pub fn page(
        &self,
        filter: &TimbreFilter,
        query: &PageQuery,
    ) -> Result<(Vec<TimbreRecord>, u64), CoreError> {
        let norm = query.normalized();
        let pattern = filter
            .name_like
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let conn = self.conn.lock();

        let total: i64 = conn
            .query_row(
                r#"
                SELECT COUNT(*) FROM timbre
                WHERE tts_model_id = ?1
                  AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\')
                "#,
                params![filter.tts_model_id, pattern],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::db("timbre count", e))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, tts_model_id, name, voice_code, languages, remark, sort,
                       created_at, updated_at
                FROM timbre
                WHERE tts_model_id = ?1
                  AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\')
                ORDER BY sort, id
                LIMIT ?3 OFFSET ?4
                "#,
            )
            .map_err(|e| CoreError::db("timbre page", e))?;

        let offset = i64::try_from(norm.offset()).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(
                params![filter.tts_model_id, pattern, norm.page_size as i64, offset],
                timbre_from_row,
            )
            .map_err(|e| CoreError::db("timbre page", e))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| CoreError::db("timbre page", e))?);
        }

        Ok((records, total as u64))
    }

    /// All timbres matching a filter, ordered by `(sort, id)`.
    pub fn list(&self, filter: &TimbreFilter) -> Result<Vec<TimbreRecord>, CoreError> {
        let pattern = filter
            .name_like
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, tts_model_id, name, voice_code, languages, remark, sort,
                       created_at, updated_at
                FROM timbre
                WHERE tts_model_id = ?1
                  AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\')
                ORDER BY sort, id
                "#,
            )
            .map_err(|e| CoreError::db("timbre list", e))?;

        let rows = stmt
            .query_map(params![filter.tts_model_id, pattern], timbre_from_row)
            .map_err(|e| CoreError::db("timbre list", e))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| CoreError::db("timbre list", e))?);
        }

        Ok(records)
    }

    /// First timbre of a model carrying `voice_code`, by `(sort, id)`.
    pub fn find_by_voice_code(
        &self,
        tts_model_id: &str,
        voice_code: &str,
    ) -> Result<Option<TimbreRecord>, CoreError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let conn = self.conn.lock();
        conn.query_row(
            r#"
            SELECT id, tts_model_id, name, voice_code, languages, remark, sort,
                   created_at, updated_at
            FROM timbre
            WHERE tts_model_id = ?1 AND voice_code = ?2
            ORDER BY sort, id
            LIMIT 1
            "#,
            params![tts_model_id, voice_code],
            timbre_from_row,
        )
        .optional()
        .map_err(|e| CoreError::db("timbre by voice code", e))
    }

    /// Total number of timbre rows.
    pub fn timbre_count(&self) -> Result<u64, CoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM timbre", [], |row| row.get(0))
            .map_err(|e| CoreError::db("timbre count", e))?;
        Ok(count as u64)
    }

    // ===================
    // Voice clone rows
    // ===================

    /// Ingest a clone row. The cloning pipeline is the usual writer.
    pub fn insert_clone(&self, clone: &VoiceCloneRecord) -> Result<(), CoreError> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO voice_clone
            (id, tts_model_id, user_id, name, train_status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                clone.id,
                clone.tts_model_id,
                clone.user_id,
                clone.name,
                clone.train_status.code(),
                clone.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| CoreError::db("clone insert", e))?;

        debug!(id = %clone.id, "Voice clone inserted");
        Ok(())
    }

    /// Fetch one clone by id.
    pub fn clone_by_id(&self, id: &str) -> Result<Option<VoiceCloneRecord>, CoreError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let conn = self.conn.lock();
        conn.query_row(
            r#"
            SELECT id, tts_model_id, user_id, name, train_status, created_at
            FROM voice_clone
            WHERE id = ?1
            "#,
            params![id],
            clone_from_row,
        )
        .optional()
        .map_err(|e| CoreError::db("clone get", e))
    }

    /// A user's successfully trained clones for a model, newest first.
    pub fn trained_clones(
        &self,
        tts_model_id: &str,
        user_id: UserId,
    ) -> Result<Vec<VoiceCloneRecord>, CoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, tts_model_id, user_id, name, train_status, created_at
                FROM voice_clone
                WHERE tts_model_id = ?1 AND user_id = ?2 AND train_status = ?3
                ORDER BY created_at DESC, id
                "#,
            )
            .map_err(|e| CoreError::db("clone list", e))?;

        let rows = stmt
            .query_map(
                params![tts_model_id, user_id, TrainStatus::Success.code()],
                clone_from_row,
            )
            .map_err(|e| CoreError::db("clone list", e))?;

        let mut clones = Vec::new();
        for row in rows {
            clones.push(row.map_err(|e| CoreError::db("clone list", e))?);
        }

        Ok(clones)
    }

    /// Point reads served so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Drop for VoiceStore {
    fn drop(&mut self) {
        if !self.file_backed {
            return;
        }

        // Truncate the WAL so it does not grow across restarts
        let conn = self.conn.lock();
        if let Err(e) = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
            warn!(error = %e, "Failed to checkpoint WAL on close");
        }
    }
}

fn timbre_from_row(row: &Row<'_>) -> rusqlite::Result<TimbreRecord> {
    Ok(TimbreRecord {
        id: row.get(0)?,
        tts_model_id: row.get(1)?,
        name: row.get(2)?,
        voice_code: row.get(3)?,
        languages: row.get(4)?,
        remark: row.get(5)?,
        sort: row.get(6)?,
        created_at: timestamp_from_column(row, 7)?,
        updated_at: timestamp_from_column(row, 8)?,
    })
}

fn clone_from_row(row: &Row<'_>) -> rusqlite::Result<VoiceCloneRecord> {
    let status_code: i64 = row.get(4)?;
    let train_status = TrainStatus::from_code(status_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Integer,
            format!("unknown train status code {status_code}").into(),
        )
    })?;

    Ok(VoiceCloneRecord {
        id: row.get(0)?,
        tts_model_id: row.get(1)?,
        user_id: row.get(2)?,
        name: row.get(3)?,
        train_status,
        created_at: timestamp_from_column(row, 5)?,
    })
}

fn timestamp_from_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Escape LIKE metacharacters, then wrap for substring matching.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    for ch in fragment.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("%{escaped}%")
}
