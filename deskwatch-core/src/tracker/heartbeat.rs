//! Liveness heartbeats
//!
//! Heartbeats are the recovery substrate: after a crash, open intervals
//! and sessions are completed at the last heartbeat time. The task runs
//! on the shared tick and fires at its own cadence, plus a final beat on
//! graceful shutdown.

use crate::db::Database;
use crate::error::Result;
use crate::types::HeartbeatKind;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct HeartbeatTask {
    db: Arc<Database>,
    username: String,
    every: Duration,
    last_beat: Option<DateTime<Utc>>,
}

impl HeartbeatTask {
    pub fn new(db: Arc<Database>, username: impl Into<String>, every: Duration) -> Self {
        Self {
            db,
            username: username.into(),
            every,
            last_beat: None,
        }
    }

    /// Record a regular heartbeat if the cadence has elapsed. The first
    /// call always fires so recovery evidence exists from the start.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        let due = match self.last_beat {
            None => true,
            Some(last) => (now - last).to_std().unwrap_or(Duration::ZERO) >= self.every,
        };
        if due {
            self.db
                .insert_heartbeat(&self.username, now, HeartbeatKind::Regular)?;
            tracing::trace!(ts = %now, "heartbeat");
            self.last_beat = Some(now);
        }
        Ok(())
    }

    /// Record the final heartbeat marking a graceful stop.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.db
            .insert_heartbeat(&self.username, now, HeartbeatKind::Final)?;
        tracing::debug!(ts = %now, "final heartbeat");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Arc<Database> {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        Arc::new(db)
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_tick_fires_immediately() {
        let db = test_db();
        let mut task = HeartbeatTask::new(db.clone(), "alice", Duration::from_secs(10));

        task.tick(ts(0)).unwrap();
        assert_eq!(db.latest_heartbeat_after("alice", ts(-1)).unwrap(), Some(ts(0)));
    }

    #[test]
    fn test_cadence_gating() {
        let db = test_db();
        let mut task = HeartbeatTask::new(db.clone(), "alice", Duration::from_secs(10));

        task.tick(ts(0)).unwrap();
        task.tick(ts(5)).unwrap();
        task.tick(ts(9)).unwrap();
        assert_eq!(db.latest_heartbeat_after("alice", ts(-1)).unwrap(), Some(ts(0)));

        task.tick(ts(10)).unwrap();
        assert_eq!(db.latest_heartbeat_after("alice", ts(-1)).unwrap(), Some(ts(10)));
    }

    #[test]
    fn test_finish_records_final_kind() {
        let db = test_db();
        let mut task = HeartbeatTask::new(db.clone(), "alice", Duration::from_secs(10));

        task.tick(ts(0)).unwrap();
        task.finish(ts(3)).unwrap();

        assert_eq!(db.latest_heartbeat_after("alice", ts(-1)).unwrap(), Some(ts(3)));
    }
}
