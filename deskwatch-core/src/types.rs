//! Core domain types for deskwatch
//!
//! These types mirror the timeline records the tracker persists:
//!
//! | Term | Definition |
//! |------|------------|
//! | **ActivityEvent** | An append-only state-transition record (locked, idle, shutdown, ...) |
//! | **HeartbeatEvent** | A periodic liveness proof; only read back during crash recovery |
//! | **WindowInterval** | One window-focus period; open while `end_time` is unset |
//! | **WorkingSession** | A derived span of user activity; at most one open per user |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Activity events
// ============================================

/// The closed set of activity event kinds the tracker emits.
///
/// `NormalShutdown`, `SystemShutdown` and `UserInterrupt` are the
/// shutdown-class kinds; they record *how* the process stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Process start; also signals that any still-open session belongs to a
    /// previous, non-graceful run
    Started,
    ScreenLocked,
    ScreenUnlocked,
    Active,
    Inactive,
    /// Host platform outside the supported set
    UnsupportedPlatform,
    /// The tracker loop ended on its own
    NormalShutdown,
    /// Terminate / hang-up / log-off class signal
    SystemShutdown,
    /// Interrupt signal (Ctrl+C)
    UserInterrupt,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Started => "started",
            ActivityKind::ScreenLocked => "screen_locked",
            ActivityKind::ScreenUnlocked => "screen_unlocked",
            ActivityKind::Active => "active",
            ActivityKind::Inactive => "inactive",
            ActivityKind::UnsupportedPlatform => "unsupported_platform",
            ActivityKind::NormalShutdown => "normal_shutdown",
            ActivityKind::SystemShutdown => "system_shutdown",
            ActivityKind::UserInterrupt => "user_interrupt",
        }
    }

    /// True for the kinds that record process termination.
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self,
            ActivityKind::NormalShutdown
                | ActivityKind::SystemShutdown
                | ActivityKind::UserInterrupt
        )
    }

    /// True for the kinds that close an open working session.
    pub fn closes_session(&self) -> bool {
        matches!(self, ActivityKind::Inactive | ActivityKind::ScreenLocked)
            || self.is_shutdown()
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(ActivityKind::Started),
            "screen_locked" => Ok(ActivityKind::ScreenLocked),
            "screen_unlocked" => Ok(ActivityKind::ScreenUnlocked),
            "active" => Ok(ActivityKind::Active),
            "inactive" => Ok(ActivityKind::Inactive),
            "unsupported_platform" => Ok(ActivityKind::UnsupportedPlatform),
            "normal_shutdown" => Ok(ActivityKind::NormalShutdown),
            "system_shutdown" => Ok(ActivityKind::SystemShutdown),
            "user_interrupt" => Ok(ActivityKind::UserInterrupt),
            _ => Err(format!("unknown activity kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// SQLite rowid
    pub id: i64,
    /// OS account the event was recorded for
    pub username: String,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub kind: ActivityKind,
}

// ============================================
// Heartbeats
// ============================================

/// Heartbeat flavor: periodic liveness vs the last write of a graceful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatKind {
    Regular,
    Final,
}

impl HeartbeatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeartbeatKind::Regular => "regular",
            HeartbeatKind::Final => "final",
        }
    }
}

impl std::str::FromStr for HeartbeatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(HeartbeatKind::Regular),
            "final" => Ok(HeartbeatKind::Final),
            _ => Err(format!("unknown heartbeat kind: {}", s)),
        }
    }
}

/// A periodic liveness proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub id: i64,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub kind: HeartbeatKind,
}

// ============================================
// Window intervals
// ============================================

/// One window-focus period. Open while `end_time` is `None`; closed exactly
/// once, after which `duration_secs = end_time - start_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInterval {
    pub id: i64,
    pub username: String,
    pub window_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: Option<f64>,
}

impl WindowInterval {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

// ============================================
// Working sessions
// ============================================

/// A derived span of user activity, delimited by an `Active` event at the
/// start and an `Inactive`/`ScreenLocked`/shutdown-class event at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingSession {
    pub id: i64,
    pub username: String,
    pub start_time: DateTime<Utc>,
    /// `None` while the session is still ongoing
    pub end_time: Option<DateTime<Utc>>,
    /// The event kind that ended the session
    pub end_reason: Option<ActivityKind>,
}

impl WorkingSession {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}
