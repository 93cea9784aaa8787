//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Append-only event streams
    -- ============================================

    CREATE TABLE IF NOT EXISTS activity_events (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        username         TEXT NOT NULL,
        timestamp        DATETIME NOT NULL,
        event            TEXT NOT NULL,

        -- One transition per (user, instant, kind); re-emission in the
        -- same tick is a silent no-op via INSERT OR IGNORE
        UNIQUE(username, timestamp, event)
    );

    CREATE TABLE IF NOT EXISTS heartbeat_events (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        username         TEXT NOT NULL,
        timestamp        DATETIME NOT NULL,
        kind             TEXT NOT NULL DEFAULT 'regular'
    );

    -- ============================================
    -- Interval records (open while end_time IS NULL)
    -- ============================================

    CREATE TABLE IF NOT EXISTS window_intervals (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        username         TEXT NOT NULL,
        window_title     TEXT NOT NULL,
        start_time       DATETIME NOT NULL,
        end_time         DATETIME,
        duration_secs    REAL
    );

    CREATE TABLE IF NOT EXISTS working_sessions (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        username         TEXT NOT NULL,
        start_time       DATETIME NOT NULL,
        end_time         DATETIME,
        end_reason       TEXT,

        UNIQUE(username, start_time)
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_activity_user_ts ON activity_events(username, timestamp);
    CREATE INDEX IF NOT EXISTS idx_heartbeat_user_ts ON heartbeat_events(username, timestamp);
    CREATE INDEX IF NOT EXISTS idx_intervals_user ON window_intervals(username);
    CREATE INDEX IF NOT EXISTS idx_intervals_open ON window_intervals(username) WHERE end_time IS NULL;
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON working_sessions(username, start_time DESC);
    CREATE INDEX IF NOT EXISTS idx_sessions_open ON working_sessions(username) WHERE end_time IS NULL;
    "#,
];

/// Run any outstanding migrations on the given connection
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "activity_events",
            "heartbeat_events",
            "window_intervals",
            "working_sessions",
        ];

        for table in tables {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }
}
