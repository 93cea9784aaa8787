//! Window-focus interval tracker
//!
//! Opens an interval the instant a new title is observed and closes it on
//! the next change, honoring the configured duration threshold: intervals
//! shorter than the threshold are closed at their own start time (zero
//! duration) so the open slot is released without recording noise.
//!
//! On startup, intervals left open by a previous run are completed from
//! heartbeat evidence: the latest heartbeat strictly after the interval's
//! start is the best available "last known alive" moment.

use crate::db::Database;
use crate::error::Result;
use crate::probe::Probe;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Sentinel title recorded when the probe cannot name the focused window
const UNKNOWN_TITLE: &str = "N/A";

struct OpenInterval {
    id: i64,
    start: DateTime<Utc>,
}

pub struct WindowIntervalTracker {
    db: Arc<Database>,
    probe: Arc<dyn Probe>,
    username: String,
    min_duration: Duration,
    last_title: Option<String>,
    open: Option<OpenInterval>,
    recovered: bool,
}

impl WindowIntervalTracker {
    pub fn new(
        db: Arc<Database>,
        probe: Arc<dyn Probe>,
        username: impl Into<String>,
        min_duration: Duration,
    ) -> Self {
        Self {
            db,
            probe,
            username: username.into(),
            min_duration,
            last_title: None,
            open: None,
            recovered: false,
        }
    }

    /// Poll the focused window title; on a change, close the previous
    /// interval and open a new one. An unchanged title is a no-op.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.recovered {
            self.recover_stale_intervals()?;
            self.recovered = true;
        }

        let title = match self.probe.window_title() {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(error = %e, "window title probe unavailable");
                UNKNOWN_TITLE.to_string()
            }
        };

        if self.last_title.as_deref() == Some(title.as_str()) {
            return Ok(());
        }

        self.close_open_interval(now)?;

        let id = self.db.open_interval(&self.username, &title, now)?;
        tracing::debug!(id, title = %title, "opened window interval");
        self.open = Some(OpenInterval { id, start: now });
        self.last_title = Some(title);
        Ok(())
    }

    /// Close the open interval per the duration threshold: real end time
    /// when it lived at least `min_duration`, otherwise a zero-duration
    /// close at its own start time.
    fn close_open_interval(&mut self, now: DateTime<Utc>) -> Result<()> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };

        let lived = (now - open.start).to_std().unwrap_or(Duration::ZERO);
        if lived >= self.min_duration {
            self.db.close_interval(open.id, now)?;
            tracing::debug!(id = open.id, secs = lived.as_secs_f64(), "closed window interval");
        } else {
            self.db.close_interval(open.id, open.start)?;
            tracing::debug!(id = open.id, "window interval below threshold, closed with zero duration");
        }
        Ok(())
    }

    /// Complete intervals a previous, non-graceful run left open. The end
    /// time is the latest heartbeat strictly after the interval's start,
    /// falling back to the start itself (zero duration) when none exists.
    fn recover_stale_intervals(&self) -> Result<()> {
        let stale = self.db.find_open_intervals(&self.username)?;
        if stale.is_empty() {
            return Ok(());
        }

        tracing::info!(count = stale.len(), "recovering intervals from previous run");
        for interval in stale {
            let end = self
                .db
                .latest_heartbeat_after(&self.username, interval.start_time)?
                .unwrap_or(interval.start_time);
            self.db.close_interval(interval.id, end)?;
            tracing::info!(
                id = interval.id,
                title = %interval.window_title,
                end = %end,
                "recovered stale window interval"
            );
        }
        Ok(())
    }

    /// Graceful-stop path: close the open interval at `now`, ignoring the
    /// duration threshold.
    pub fn shutdown(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(open) = self.open.take() {
            self.db.close_interval(open.id, now)?;
            tracing::info!(id = open.id, "closed window interval on shutdown");
            self.last_title = None;
        }
        Ok(())
    }
}
