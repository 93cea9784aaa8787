//! macOS implementation of the desktop probes.
//!
//! Idle time comes from `ioreg`'s `HIDIdleTime` property (nanoseconds), the
//! focused window title from an `osascript` query against System Events.
//! There is no reliable lock query without a private-framework call, so
//! `screen_locked` reports `Unsupported` and the tracker degrades to
//! "not locked" with a logged warning.

use super::{Probe, ProbeError};
use std::process::Command;
use std::time::Duration;

const TITLE_SCRIPT: &str = r#"tell application "System Events" to get name of first application process whose frontmost is true"#;

#[derive(Debug, Default)]
pub struct MacosProbe;

impl MacosProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Probe for MacosProbe {
    fn idle_time(&self) -> Result<Duration, ProbeError> {
        let output = Command::new("ioreg")
            .args(["-c", "IOHIDSystem", "-d", "4"])
            .output()?;
        if !output.status.success() {
            return Err(ProbeError::Command(format!(
                "ioreg exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let nanos = stdout
            .lines()
            .find(|line| line.contains("HIDIdleTime"))
            .and_then(|line| line.rsplit('=').next())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| ProbeError::Parse("no HIDIdleTime in ioreg output".to_string()))?;

        Ok(Duration::from_nanos(nanos))
    }

    fn screen_locked(&self) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported("screen lock detection"))
    }

    fn window_title(&self) -> Result<String, ProbeError> {
        let output = Command::new("osascript")
            .args(["-e", TITLE_SCRIPT])
            .output()?;
        if !output.status.success() {
            return Err(ProbeError::Command(format!(
                "osascript exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
