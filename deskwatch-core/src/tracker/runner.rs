//! Serial tracker loop
//!
//! One thread drives everything on a fixed cadence: heartbeat first, then
//! the activity state machine, then the window tracker. Each step logs its
//! own failures and the loop keeps going; only a shutdown request (or an
//! optional run duration) ends it.

use crate::config::TrackerConfig;
use crate::db::Database;
use crate::probe::Probe;
use crate::tracker::activity::ActivityStateMachine;
use crate::tracker::heartbeat::HeartbeatTask;
use crate::tracker::session::SessionDeriver;
use crate::tracker::shutdown::{ShutdownCause, ShutdownCoordinator};
use crate::tracker::window::WindowIntervalTracker;
use crate::types::ActivityKind;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub struct TrackerRunner {
    state_machine: ActivityStateMachine,
    heartbeat: HeartbeatTask,
    deriver: SessionDeriver,
    window: Arc<Mutex<WindowIntervalTracker>>,
    coordinator: ShutdownCoordinator,
    tick_interval: Duration,
}

impl TrackerRunner {
    pub fn new(
        db: Arc<Database>,
        probe: Arc<dyn Probe>,
        config: &TrackerConfig,
        coordinator: ShutdownCoordinator,
    ) -> Self {
        let username = config.username();
        let window = Arc::new(Mutex::new(WindowIntervalTracker::new(
            db.clone(),
            probe.clone(),
            &username,
            config.window_event_interval(),
        )));

        let window_cleanup = window.clone();
        coordinator.register_cleanup("window-intervals", move || {
            window_cleanup.lock().unwrap().shutdown(Utc::now())
        });

        Self {
            state_machine: ActivityStateMachine::new(probe, config.idle_threshold()),
            heartbeat: HeartbeatTask::new(db.clone(), &username, config.heartbeat_every()),
            deriver: SessionDeriver::new(db, username),
            window,
            coordinator,
            tick_interval: config.tick_interval(),
        }
    }

    /// Run until a shutdown is requested, or until `duration` elapses when
    /// given. Blocks the calling thread.
    pub fn run(&mut self, duration: Option<Duration>) {
        if !crate::probe::platform_supported() {
            tracing::error!(os = std::env::consts::OS, "platform not supported");
            if let Err(e) = self
                .deriver
                .record(ActivityKind::UnsupportedPlatform, Utc::now())
            {
                tracing::error!(error = %e, "failed to record unsupported platform");
            }
            self.coordinator.run_cleanups();
            return;
        }

        tracing::info!(tick_ms = self.tick_interval.as_millis() as u64, "tracker starting");
        let started = Instant::now();

        loop {
            if self.coordinator.is_requested() {
                break;
            }
            if let Some(limit) = duration {
                if started.elapsed() >= limit {
                    self.coordinator.request(ShutdownCause::Normal);
                    break;
                }
            }
            self.tick_once();
            std::thread::sleep(self.tick_interval);
        }

        self.finalize();
    }

    /// One pass over heartbeat, activity machine, and window tracker.
    /// Failures are logged and do not abort the pass.
    pub fn tick_once(&mut self) {
        let now = Utc::now();

        if let Err(e) = self.heartbeat.tick(now) {
            tracing::error!(error = %e, "heartbeat write failed");
        }

        for kind in self.state_machine.tick() {
            if let Err(e) = self.deriver.record(kind, now) {
                tracing::error!(kind = %kind, error = %e, "activity event write failed");
            }
        }

        if let Err(e) = self.window.lock().unwrap().tick(now) {
            tracing::error!(error = %e, "window interval update failed");
        }
    }

    /// Teardown: record the shutdown event, write the final heartbeat, and
    /// drain the cleanup callbacks.
    pub fn finalize(&mut self) {
        let now = Utc::now();
        let cause = self.coordinator.cause().unwrap_or(ShutdownCause::Normal);

        if let Err(e) = self.deriver.record(cause.activity_kind(), now) {
            tracing::error!(error = %e, "failed to record shutdown event");
        }
        if let Err(e) = self.heartbeat.finish(now) {
            tracing::error!(error = %e, "final heartbeat write failed");
        }
        self.coordinator.run_cleanups();
        tracing::info!(?cause, "tracker stopped");
    }
}
