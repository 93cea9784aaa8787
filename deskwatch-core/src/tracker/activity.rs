//! Activity state machine
//!
//! Converts the lock and idle probes into state-transition events. The
//! machine owns nothing but its current state; `tick` returns the kinds it
//! emitted and the runner records them, which keeps the machine free of any
//! sink coupling and directly testable.

use crate::probe::Probe;
use crate::types::ActivityKind;
use std::sync::Arc;
use std::time::Duration;

/// The four states of the activity machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    /// No tick has run yet
    Uninitialized,
    Locked,
    UnlockedActive,
    UnlockedIdle,
}

pub struct ActivityStateMachine {
    probe: Arc<dyn Probe>,
    idle_threshold: Duration,
    state: ActivityState,
}

impl ActivityStateMachine {
    pub fn new(probe: Arc<dyn Probe>, idle_threshold: Duration) -> Self {
        Self {
            probe,
            idle_threshold,
            state: ActivityState::Uninitialized,
        }
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    /// Evaluate the probes and return the events this tick emits, in order.
    ///
    /// Lock state is evaluated before idle state; on a tick where a lock
    /// transition happened, no separate idle check runs (the unlock branch
    /// performs its own immediate re-classification).
    pub fn tick(&mut self) -> Vec<ActivityKind> {
        let mut emitted = Vec::new();
        let locked = self.locked();

        match self.state {
            ActivityState::Uninitialized => {
                emitted.push(ActivityKind::Started);
                if locked {
                    emitted.push(ActivityKind::ScreenLocked);
                    self.state = ActivityState::Locked;
                } else {
                    let (state, kind) = self.classify_idle();
                    emitted.push(kind);
                    self.state = state;
                }
            }
            ActivityState::Locked => {
                if !locked {
                    emitted.push(ActivityKind::ScreenUnlocked);
                    let (state, kind) = self.classify_idle();
                    emitted.push(kind);
                    self.state = state;
                }
            }
            ActivityState::UnlockedActive | ActivityState::UnlockedIdle => {
                if locked {
                    // Locking discards idle memory; it is re-derived on unlock
                    emitted.push(ActivityKind::ScreenLocked);
                    self.state = ActivityState::Locked;
                } else {
                    let (state, kind) = self.classify_idle();
                    if state != self.state {
                        emitted.push(kind);
                        self.state = state;
                    }
                }
            }
        }

        emitted
    }

    /// Idle classification: `idle >= threshold` counts as idle, so idle time
    /// exactly at the threshold is `Inactive`.
    fn classify_idle(&self) -> (ActivityState, ActivityKind) {
        if self.idle_duration() >= self.idle_threshold {
            (ActivityState::UnlockedIdle, ActivityKind::Inactive)
        } else {
            (ActivityState::UnlockedActive, ActivityKind::Active)
        }
    }

    fn locked(&self) -> bool {
        match self.probe.screen_locked() {
            Ok(locked) => locked,
            Err(e) => {
                tracing::warn!(error = %e, "lock probe unavailable, assuming unlocked");
                false
            }
        }
    }

    fn idle_duration(&self) -> Duration {
        match self.probe.idle_time() {
            Ok(idle) => idle,
            Err(e) => {
                tracing::warn!(error = %e, "idle probe unavailable, assuming zero idle time");
                Duration::ZERO
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProbe {
        locked: Mutex<bool>,
        idle: Mutex<Duration>,
        failing: Mutex<bool>,
    }

    impl FakeProbe {
        fn set_locked(&self, locked: bool) {
            *self.locked.lock().unwrap() = locked;
        }

        fn set_idle(&self, idle: Duration) {
            *self.idle.lock().unwrap() = idle;
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    impl Probe for FakeProbe {
        fn idle_time(&self) -> Result<Duration, ProbeError> {
            if *self.failing.lock().unwrap() {
                return Err(ProbeError::Unsupported("idle detection"));
            }
            Ok(*self.idle.lock().unwrap())
        }

        fn screen_locked(&self) -> Result<bool, ProbeError> {
            if *self.failing.lock().unwrap() {
                return Err(ProbeError::Unsupported("screen lock detection"));
            }
            Ok(*self.locked.lock().unwrap())
        }

        fn window_title(&self) -> Result<String, ProbeError> {
            Ok("fake".to_string())
        }
    }

    fn machine(probe: &Arc<FakeProbe>) -> ActivityStateMachine {
        ActivityStateMachine::new(probe.clone() as Arc<dyn Probe>, Duration::from_secs(10))
    }

    #[test]
    fn test_first_tick_unlocked_active() {
        let probe = Arc::new(FakeProbe::default());
        let mut fsm = machine(&probe);

        assert_eq!(
            fsm.tick(),
            vec![ActivityKind::Started, ActivityKind::Active]
        );
        assert_eq!(fsm.state(), ActivityState::UnlockedActive);

        // Unchanged state emits nothing
        assert!(fsm.tick().is_empty());
    }

    #[test]
    fn test_first_tick_locked() {
        let probe = Arc::new(FakeProbe::default());
        probe.set_locked(true);
        let mut fsm = machine(&probe);

        assert_eq!(
            fsm.tick(),
            vec![ActivityKind::Started, ActivityKind::ScreenLocked]
        );
        assert_eq!(fsm.state(), ActivityState::Locked);
    }

    #[test]
    fn test_idle_boundary_is_inactive() {
        let probe = Arc::new(FakeProbe::default());
        probe.set_idle(Duration::from_secs(10));
        let mut fsm = machine(&probe);

        // Exactly at the threshold counts as idle
        assert_eq!(
            fsm.tick(),
            vec![ActivityKind::Started, ActivityKind::Inactive]
        );
        assert_eq!(fsm.state(), ActivityState::UnlockedIdle);

        // One below the threshold flips back to active
        probe.set_idle(Duration::from_secs(9));
        assert_eq!(fsm.tick(), vec![ActivityKind::Active]);
    }

    #[test]
    fn test_lock_unlock_cycle() {
        let probe = Arc::new(FakeProbe::default());
        let mut fsm = machine(&probe);
        fsm.tick();

        probe.set_locked(true);
        assert_eq!(fsm.tick(), vec![ActivityKind::ScreenLocked]);
        // Still locked: nothing new
        assert!(fsm.tick().is_empty());

        // Unlock re-classifies idle immediately
        probe.set_locked(false);
        probe.set_idle(Duration::from_secs(60));
        assert_eq!(
            fsm.tick(),
            vec![ActivityKind::ScreenUnlocked, ActivityKind::Inactive]
        );
        assert_eq!(fsm.state(), ActivityState::UnlockedIdle);
    }

    #[test]
    fn test_lock_discards_idle_memory() {
        let probe = Arc::new(FakeProbe::default());
        probe.set_idle(Duration::from_secs(60));
        let mut fsm = machine(&probe);
        fsm.tick();
        assert_eq!(fsm.state(), ActivityState::UnlockedIdle);

        probe.set_locked(true);
        fsm.tick();

        // Unlocking while still over the threshold re-emits Inactive even
        // though the machine was idle before the lock
        probe.set_locked(false);
        assert_eq!(
            fsm.tick(),
            vec![ActivityKind::ScreenUnlocked, ActivityKind::Inactive]
        );
    }

    #[test]
    fn test_probe_failure_degrades_to_active() {
        let probe = Arc::new(FakeProbe::default());
        probe.set_failing(true);
        let mut fsm = machine(&probe);

        // Unreadable probes behave as unlocked with zero idle time
        assert_eq!(
            fsm.tick(),
            vec![ActivityKind::Started, ActivityKind::Active]
        );
        assert_eq!(fsm.state(), ActivityState::UnlockedActive);
    }
}
