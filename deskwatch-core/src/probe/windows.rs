//! Windows implementation of the desktop probes.
//!
//! Uses Win32 directly: `GetLastInputInfo` for idle time, the
//! `OpenDesktopW`/`SwitchDesktop` trick for lock state (switching to the
//! default desktop fails while the secure desktop is up), and
//! `GetForegroundWindow`/`GetWindowTextW` for the focused window title.

use super::{Probe, ProbeError};
use std::time::Duration;
use windows::core::w;
use windows::Win32::System::StationsAndDesktops::{
    CloseDesktop, OpenDesktopW, SwitchDesktop, DESKTOP_CONTROL_FLAGS, DESKTOP_SWITCHDESKTOP,
};
use windows::Win32::System::SystemInformation::GetTickCount;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

#[derive(Debug, Default)]
pub struct WindowsProbe;

impl WindowsProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Probe for WindowsProbe {
    fn idle_time(&self) -> Result<Duration, ProbeError> {
        let mut info = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };

        // SAFETY: info is a valid, correctly sized LASTINPUTINFO
        let ok = unsafe { GetLastInputInfo(&mut info) };
        if !ok.as_bool() {
            return Err(ProbeError::Command("GetLastInputInfo failed".to_string()));
        }

        // Tick counts wrap every ~49 days; wrapping_sub keeps the delta sane
        let elapsed_ms = unsafe { GetTickCount() }.wrapping_sub(info.dwTime);
        Ok(Duration::from_millis(u64::from(elapsed_ms)))
    }

    fn screen_locked(&self) -> Result<bool, ProbeError> {
        // SAFETY: plain Win32 desktop-handle calls; the handle is closed
        // before returning on every path
        unsafe {
            let desktop = OpenDesktopW(
                w!("Default"),
                DESKTOP_CONTROL_FLAGS(0),
                false,
                DESKTOP_SWITCHDESKTOP,
            )
            .map_err(|e| ProbeError::Command(format!("OpenDesktopW failed: {}", e)))?;

            let locked = SwitchDesktop(desktop).is_err();
            let _ = CloseDesktop(desktop);
            Ok(locked)
        }
    }

    fn window_title(&self) -> Result<String, ProbeError> {
        // SAFETY: a zero HWND is checked before use; GetWindowTextW writes
        // at most buf.len() - 1 characters plus a terminator
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return Err(ProbeError::Command("no foreground window".to_string()));
            }

            let mut buf = [0u16; 512];
            let len = GetWindowTextW(hwnd, &mut buf);
            if len <= 0 {
                return Err(ProbeError::Parse("empty window title".to_string()));
            }

            Ok(String::from_utf16_lossy(&buf[..len as usize]))
        }
    }
}
