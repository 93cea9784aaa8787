//! Linux implementation of the desktop probes.
//!
//! Shells out to the usual X11 desktop tools: `xprintidle` for idle time,
//! `xdotool` for the focused window title, and `gnome-screensaver-command`
//! with a `loginctl` fallback for the lock state. All three are best-effort;
//! a missing tool surfaces as a `ProbeError` and the tracker degrades.

use super::{Probe, ProbeError};
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct LinuxProbe;

impl LinuxProbe {
    pub fn new() -> Self {
        Self
    }

    /// The `loginctl` session id for the current uid, if one exists
    fn current_session_id(&self) -> Option<String> {
        let output = Command::new("loginctl")
            .args(["list-sessions", "--no-legend"])
            .output()
            .ok()?;
        let uid = run_id_command()?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 && parts.get(1) == Some(&uid.as_str()) {
                return Some(parts[0].to_string());
            }
        }
        None
    }

    fn locked_via_screensaver(&self) -> Option<bool> {
        let output = Command::new("gnome-screensaver-command")
            .arg("-q")
            .output()
            .ok()?;
        Some(String::from_utf8_lossy(&output.stdout).contains("is active"))
    }

    fn locked_via_loginctl(&self) -> Option<bool> {
        let session = self.current_session_id()?;
        let output = Command::new("loginctl")
            .args(["show-session", &session, "-p", "LockedHint"])
            .output()
            .ok()?;
        Some(String::from_utf8_lossy(&output.stdout).contains("LockedHint=yes"))
    }
}

impl Probe for LinuxProbe {
    fn idle_time(&self) -> Result<Duration, ProbeError> {
        let output = Command::new("xprintidle").output()?;
        if !output.status.success() {
            return Err(ProbeError::Command(format!(
                "xprintidle exited with {}",
                output.status
            )));
        }

        let millis: u64 = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .map_err(|e| ProbeError::Parse(format!("xprintidle output: {}", e)))?;
        Ok(Duration::from_millis(millis))
    }

    fn screen_locked(&self) -> Result<bool, ProbeError> {
        if let Some(locked) = self.locked_via_screensaver() {
            if locked {
                return Ok(true);
            }
        }
        if let Some(locked) = self.locked_via_loginctl() {
            return Ok(locked);
        }
        // Neither detector available: report unlocked rather than guessing
        Ok(false)
    }

    fn window_title(&self) -> Result<String, ProbeError> {
        let win_id = Command::new("xdotool").arg("getwindowfocus").output()?;
        if !win_id.status.success() {
            return Err(ProbeError::Command(format!(
                "xdotool getwindowfocus exited with {}",
                win_id.status
            )));
        }

        let id = String::from_utf8_lossy(&win_id.stdout).trim().to_string();
        let title = Command::new("xdotool")
            .args(["getwindowname", &id])
            .output()?;
        if !title.status.success() {
            return Err(ProbeError::Command(format!(
                "xdotool getwindowname exited with {}",
                title.status
            )));
        }

        Ok(String::from_utf8_lossy(&title.stdout).trim().to_string())
    }
}

/// The current uid as a string, via `id -u`
fn run_id_command() -> Option<String> {
    let output = Command::new("id").arg("-u").output().ok()?;
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
