//! Desktop capability probes.
//!
//! This module provides platform-specific queries for the three signals the
//! tracker consumes: seconds since last input, screen-lock state, and the
//! focused window title. Each query is a pure function of the desktop state
//! and returns an explicit error instead of panicking or guessing; callers
//! apply the documented degraded defaults (not idle, not locked, `"N/A"`
//! title) when a probe is unavailable.

use std::time::Duration;
use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

/// Errors a capability probe can return.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The query has no implementation on this platform
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// A helper command could not be spawned or exited non-zero
    #[error("probe command failed: {0}")]
    Command(String),

    /// The underlying tool produced output we could not interpret
    #[error("unreadable probe output: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        ProbeError::Command(e.to_string())
    }
}

/// Desktop state queries the tracker polls every tick.
pub trait Probe: Send + Sync {
    /// Time since the last user input
    fn idle_time(&self) -> Result<Duration, ProbeError>;

    /// Whether the screen is currently locked
    fn screen_locked(&self) -> Result<bool, ProbeError>;

    /// Title of the currently focused window
    fn window_title(&self) -> Result<String, ProbeError>;
}

/// Platform-agnostic probe type alias
#[cfg(target_os = "linux")]
pub type SystemProbe = linux::LinuxProbe;

/// Platform-agnostic probe type alias
#[cfg(target_os = "macos")]
pub type SystemProbe = macos::MacosProbe;

/// Platform-agnostic probe type alias
#[cfg(target_os = "windows")]
pub type SystemProbe = windows::WindowsProbe;

/// Hosts the tracker knows how to probe
pub const SUPPORTED_PLATFORMS: &[&str] = &["linux", "macos", "windows"];

/// Whether the host platform is in the supported set
pub fn platform_supported() -> bool {
    SUPPORTED_PLATFORMS.contains(&std::env::consts::OS)
}

/// Fallback probe for unsupported targets so the crate still compiles there;
/// every query reports `Unsupported` and the tracker degrades accordingly.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub type SystemProbe = unsupported::UnsupportedProbe;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub mod unsupported {
    use super::{Probe, ProbeError};
    use std::time::Duration;

    #[derive(Debug, Default)]
    pub struct UnsupportedProbe;

    impl UnsupportedProbe {
        pub fn new() -> Self {
            Self
        }
    }

    impl Probe for UnsupportedProbe {
        fn idle_time(&self) -> Result<Duration, ProbeError> {
            Err(ProbeError::Unsupported("idle detection"))
        }

        fn screen_locked(&self) -> Result<bool, ProbeError> {
            Err(ProbeError::Unsupported("screen lock detection"))
        }

        fn window_title(&self) -> Result<String, ProbeError> {
            Err(ProbeError::Unsupported("window title detection"))
        }
    }
}
