//! Database repository layer
//!
//! Provides insert and query operations for the tracker's record types.
//! Interval and session completion use `WHERE end_time IS NULL` guards so a
//! second close is a no-op: an end time, once set, is never reset.

use crate::error::{Error, Result};
use crate::types::{
    ActivityEvent, ActivityKind, HeartbeatKind, WindowInterval, WorkingSession,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode so the daemon's synchronous writes don't block readers
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Activity events
    // ============================================

    /// Insert an activity event. Returns `false` when the identical
    /// (username, timestamp, event) row already exists.
    pub fn insert_activity(
        &self,
        username: &str,
        timestamp: DateTime<Utc>,
        kind: ActivityKind,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO activity_events (username, timestamp, event)
            VALUES (?1, ?2, ?3)
            "#,
            params![username, timestamp.to_rfc3339(), kind.as_str()],
        )?;
        Ok(inserted > 0)
    }

    /// Most recent activity events for a user, newest first
    pub fn recent_activity(&self, username: &str, limit: usize) -> Result<Vec<ActivityEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, username, timestamp, event
            FROM activity_events
            WHERE username = ?1
            ORDER BY timestamp DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![username, limit as i64], Self::row_to_activity)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    fn row_to_activity(row: &Row) -> rusqlite::Result<ActivityEvent> {
        let ts_str: String = row.get("timestamp")?;
        let kind_str: String = row.get("event")?;

        Ok(ActivityEvent {
            id: row.get("id")?,
            username: row.get("username")?,
            timestamp: parse_ts(&ts_str)?,
            kind: ActivityKind::from_str(&kind_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    e.into(),
                )
            })?,
        })
    }

    // ============================================
    // Heartbeats
    // ============================================

    /// Insert a heartbeat row
    pub fn insert_heartbeat(
        &self,
        username: &str,
        timestamp: DateTime<Utc>,
        kind: HeartbeatKind,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO heartbeat_events (username, timestamp, kind)
            VALUES (?1, ?2, ?3)
            "#,
            params![username, timestamp.to_rfc3339(), kind.as_str()],
        )?;
        Ok(())
    }

    /// Timestamp of the latest heartbeat strictly after `after`, with no
    /// upper bound
    pub fn latest_heartbeat_after(
        &self,
        username: &str,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let ts: Option<String> = conn
            .query_row(
                r#"
                SELECT timestamp FROM heartbeat_events
                WHERE username = ?1 AND timestamp > ?2
                ORDER BY timestamp DESC
                LIMIT 1
                "#,
                params![username, after.to_rfc3339()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(ts.map(|s| parse_ts(&s)).transpose()?)
    }

    /// Timestamp of the latest heartbeat strictly between `after` and
    /// `before` (both exclusive)
    pub fn latest_heartbeat_between(
        &self,
        username: &str,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let ts: Option<String> = conn
            .query_row(
                r#"
                SELECT timestamp FROM heartbeat_events
                WHERE username = ?1 AND timestamp > ?2 AND timestamp < ?3
                ORDER BY timestamp DESC
                LIMIT 1
                "#,
                params![username, after.to_rfc3339(), before.to_rfc3339()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(ts.map(|s| parse_ts(&s)).transpose()?)
    }

    // ============================================
    // Window intervals
    // ============================================

    /// Create an open interval (end_time NULL) and return its id
    pub fn open_interval(
        &self,
        username: &str,
        window_title: &str,
        start_time: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO window_intervals (username, window_title, start_time)
            VALUES (?1, ?2, ?3)
            "#,
            params![username, window_title, start_time.to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get an interval by id
    pub fn get_interval(&self, id: i64) -> Result<Option<WindowInterval>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM window_intervals WHERE id = ?",
            [id],
            Self::row_to_interval,
        )
        .optional()
        .map_err(Error::from)
    }

    /// All intervals for a user still missing an end time, oldest first
    pub fn find_open_intervals(&self, username: &str) -> Result<Vec<WindowInterval>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM window_intervals
            WHERE username = ?1 AND end_time IS NULL
            ORDER BY start_time ASC
            "#,
        )?;

        let rows = stmt.query_map([username], Self::row_to_interval)?;
        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?);
        }
        Ok(intervals)
    }

    /// Close an interval, recording `end_time` and the derived duration.
    /// Returns `false` (and changes nothing) when the interval is missing
    /// or already closed.
    pub fn close_interval(&self, id: i64, end_time: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        let start: Option<String> = conn
            .query_row(
                "SELECT start_time FROM window_intervals WHERE id = ?1 AND end_time IS NULL",
                [id],
                |r| r.get(0),
            )
            .optional()?;

        let Some(start) = start else {
            return Ok(false);
        };

        let duration = (end_time - parse_ts(&start)?)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let updated = conn.execute(
            r#"
            UPDATE window_intervals
            SET end_time = ?2, duration_secs = ?3
            WHERE id = ?1 AND end_time IS NULL
            "#,
            params![id, end_time.to_rfc3339(), duration],
        )?;
        Ok(updated > 0)
    }

    fn row_to_interval(row: &Row) -> rusqlite::Result<WindowInterval> {
        let start_str: String = row.get("start_time")?;
        let end_str: Option<String> = row.get("end_time")?;

        Ok(WindowInterval {
            id: row.get("id")?,
            username: row.get("username")?,
            window_title: row.get("window_title")?,
            start_time: parse_ts(&start_str)?,
            end_time: end_str.map(|s| parse_ts(&s)).transpose()?,
            duration_secs: row.get("duration_secs")?,
        })
    }

    // ============================================
    // Working sessions
    // ============================================

    /// Create an open session and return its id
    pub fn open_session(&self, username: &str, start_time: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO working_sessions (username, start_time)
            VALUES (?1, ?2)
            "#,
            params![username, start_time.to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recent session for a user still missing an end time
    pub fn find_open_session(&self, username: &str) -> Result<Option<WorkingSession>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT * FROM working_sessions
            WHERE username = ?1 AND end_time IS NULL
            ORDER BY start_time DESC
            LIMIT 1
            "#,
            [username],
            Self::row_to_session,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Get a session by id
    pub fn get_session(&self, id: i64) -> Result<Option<WorkingSession>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM working_sessions WHERE id = ?",
            [id],
            Self::row_to_session,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Close a session with the given end time and reason. Returns `false`
    /// when the session is missing or already closed.
    pub fn close_session(
        &self,
        id: i64,
        end_time: DateTime<Utc>,
        end_reason: ActivityKind,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            r#"
            UPDATE working_sessions
            SET end_time = ?2, end_reason = ?3
            WHERE id = ?1 AND end_time IS NULL
            "#,
            params![id, end_time.to_rfc3339(), end_reason.as_str()],
        )?;
        Ok(updated > 0)
    }

    fn row_to_session(row: &Row) -> rusqlite::Result<WorkingSession> {
        let start_str: String = row.get("start_time")?;
        let end_str: Option<String> = row.get("end_time")?;
        let reason_str: Option<String> = row.get("end_reason")?;

        Ok(WorkingSession {
            id: row.get("id")?,
            username: row.get("username")?,
            start_time: parse_ts(&start_str)?,
            end_time: end_str.map(|s| parse_ts(&s)).transpose()?,
            end_reason: reason_str.and_then(|s| ActivityKind::from_str(&s).ok()),
        })
    }
}

/// Parse an RFC 3339 timestamp stored by this layer. A malformed value
/// surfaces as a conversion error; it is never replaced with a made-up time.
fn parse_ts(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}
