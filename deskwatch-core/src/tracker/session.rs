//! Working-session derivation
//!
//! Sessions are derived from the activity event stream as it is recorded:
//! an `active` event opens a session when none is open, a lock, an idle
//! transition, or any shutdown event closes it. A `started` event closes a
//! session a previous run left open, backdated to heartbeat evidence from
//! between the session's start and the new launch, or closed at the launch
//! time itself when no heartbeat landed in between.

use crate::db::Database;
use crate::error::Result;
use crate::types::ActivityKind;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct SessionDeriver {
    db: Arc<Database>,
    username: String,
}

impl SessionDeriver {
    pub fn new(db: Arc<Database>, username: impl Into<String>) -> Self {
        Self {
            db,
            username: username.into(),
        }
    }

    /// Record an activity event and fold it into the session state.
    /// Duplicate events (same user, timestamp, and kind) are dropped by
    /// the store and do not re-apply.
    pub fn record(&self, kind: ActivityKind, timestamp: DateTime<Utc>) -> Result<()> {
        let inserted = self.db.insert_activity(&self.username, timestamp, kind)?;
        if !inserted {
            tracing::debug!(kind = %kind, ts = %timestamp, "duplicate activity event dropped");
            return Ok(());
        }
        tracing::debug!(kind = %kind, ts = %timestamp, "recorded activity event");
        self.apply(kind, timestamp)
    }

    fn apply(&self, kind: ActivityKind, timestamp: DateTime<Utc>) -> Result<()> {
        match kind {
            ActivityKind::Active => {
                if self.db.find_open_session(&self.username)?.is_none() {
                    let id = self.db.open_session(&self.username, timestamp)?;
                    tracing::info!(id, start = %timestamp, "opened working session");
                }
            }
            ActivityKind::Started => self.close_stale_session(timestamp)?,
            kind if kind.closes_session() => {
                if let Some(session) = self.db.find_open_session(&self.username)? {
                    self.db.close_session(session.id, timestamp, kind)?;
                    tracing::info!(id = session.id, reason = %kind, "closed working session");
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// A session still open at launch means the previous run died without
    /// closing it. Backdate its end to the latest heartbeat between its
    /// start and now, or to the launch time when no heartbeat landed.
    fn close_stale_session(&self, now: DateTime<Utc>) -> Result<()> {
        let Some(session) = self.db.find_open_session(&self.username)? else {
            return Ok(());
        };

        let end = self
            .db
            .latest_heartbeat_between(&self.username, session.start_time, now)?
            .unwrap_or(now);
        self.db
            .close_session(session.id, end, ActivityKind::Started)?;
        tracing::info!(
            id = session.id,
            end = %end,
            "recovered stale working session"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeartbeatKind;
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
    fn test_active_opens_session_once() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Active, ts(0)).unwrap();
        deriver.record(ActivityKind::Active, ts(10)).unwrap();

        let session = db.find_open_session("alice").unwrap().unwrap();
        assert_eq!(session.start_time, ts(0));
    }

    #[test]
    fn test_lock_closes_session() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Active, ts(0)).unwrap();
        deriver.record(ActivityKind::ScreenLocked, ts(30)).unwrap();

        assert!(db.find_open_session("alice").unwrap().is_none());
        let session = db.get_session(1).unwrap().unwrap();
        assert_eq!(session.end_time, Some(ts(30)));
        assert_eq!(session.end_reason, Some(ActivityKind::ScreenLocked));
    }

    #[test]
    fn test_idle_closes_session() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Active, ts(0)).unwrap();
        deriver.record(ActivityKind::Inactive, ts(60)).unwrap();

        let session = db.get_session(1).unwrap().unwrap();
        assert_eq!(session.end_reason, Some(ActivityKind::Inactive));
    }

    #[test]
    fn test_close_without_open_session_is_noop() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::ScreenLocked, ts(0)).unwrap();
        deriver.record(ActivityKind::Inactive, ts(5)).unwrap();

        assert!(db.get_session(1).unwrap().is_none());
    }

    #[test]
    fn test_started_backdates_stale_session_to_heartbeat() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Active, ts(0)).unwrap();
        for offset in [5, 10, 15] {
            db.insert_heartbeat("alice", ts(offset), HeartbeatKind::Regular)
                .unwrap();
        }

        // Next launch: the open session ends at the last heartbeat, not now
        deriver.record(ActivityKind::Started, ts(300)).unwrap();

        let session = db.get_session(1).unwrap().unwrap();
        assert_eq!(session.end_time, Some(ts(15)));
        assert_eq!(session.end_reason, Some(ActivityKind::Started));
    }

    #[test]
    fn test_started_without_heartbeats_closes_at_launch_time() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Active, ts(0)).unwrap();
        deriver.record(ActivityKind::Started, ts(300)).unwrap();

        // No heartbeat evidence: the launch timestamp is the best bound
        let session = db.get_session(1).unwrap().unwrap();
        assert_eq!(session.end_time, Some(ts(300)));
        assert_eq!(session.end_reason, Some(ActivityKind::Started));
    }

    #[test]
    fn test_started_with_no_open_session_is_noop() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Started, ts(0)).unwrap();
        assert!(db.get_session(1).unwrap().is_none());
    }

    #[test]
    fn test_shutdown_kinds_close_with_their_reason() {
        for kind in [
            ActivityKind::NormalShutdown,
            ActivityKind::SystemShutdown,
            ActivityKind::UserInterrupt,
        ] {
            let db = test_db();
            let deriver = SessionDeriver::new(db.clone(), "alice");

            deriver.record(ActivityKind::Active, ts(0)).unwrap();
            deriver.record(kind, ts(60)).unwrap();

            let session = db.get_session(1).unwrap().unwrap();
            assert_eq!(session.end_reason, Some(kind));
        }
    }

    #[test]
    fn test_duplicate_event_does_not_reapply() {
        let db = test_db();
        let deriver = SessionDeriver::new(db.clone(), "alice");

        deriver.record(ActivityKind::Active, ts(0)).unwrap();
        deriver.record(ActivityKind::ScreenLocked, ts(30)).unwrap();
        // Replaying active at the same instant must not reopen anything
        deriver.record(ActivityKind::Active, ts(0)).unwrap();

        assert!(db.find_open_session("alice").unwrap().is_none());
    }
}
