//! Shutdown coordination
//!
//! Signal handlers and the run loop share a coordinator: handlers request
//! a stop with a cause, the loop observes the request and drains cleanup
//! callbacks exactly once. The first requested cause wins; later requests
//! are ignored so a SIGTERM arriving mid-teardown cannot relabel an
//! interrupt already in flight.

use crate::error::Result;
use crate::types::ActivityKind;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Why the tracker is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// Run loop finished on its own (duration elapsed, unsupported platform)
    Normal,
    /// Interactive interrupt (Ctrl-C / SIGINT)
    UserInterrupt,
    /// Host-initiated stop (SIGTERM, SIGHUP, logoff, power-off)
    SystemShutdown,
}

impl ShutdownCause {
    pub fn activity_kind(self) -> ActivityKind {
        match self {
            ShutdownCause::Normal => ActivityKind::NormalShutdown,
            ShutdownCause::UserInterrupt => ActivityKind::UserInterrupt,
            ShutdownCause::SystemShutdown => ActivityKind::SystemShutdown,
        }
    }
}

const CAUSE_NONE: u8 = 0;
const CAUSE_NORMAL: u8 = 1;
const CAUSE_USER: u8 = 2;
const CAUSE_SYSTEM: u8 = 3;

type Cleanup = Box<dyn FnOnce() -> Result<()> + Send>;

#[derive(Clone)]
pub struct ShutdownCoordinator {
    cause: Arc<AtomicU8>,
    cleaned: Arc<AtomicBool>,
    cleanups: Arc<Mutex<Vec<(&'static str, Cleanup)>>>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            cause: Arc::new(AtomicU8::new(CAUSE_NONE)),
            cleaned: Arc::new(AtomicBool::new(false)),
            cleanups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a cleanup callback, run once during teardown in
    /// registration order. `name` labels failures in the log.
    pub fn register_cleanup<F>(&self, name: &'static str, f: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.cleanups.lock().unwrap().push((name, Box::new(f)));
    }

    /// Request a stop. Only the first call sets the cause.
    pub fn request(&self, cause: ShutdownCause) {
        let raw = match cause {
            ShutdownCause::Normal => CAUSE_NORMAL,
            ShutdownCause::UserInterrupt => CAUSE_USER,
            ShutdownCause::SystemShutdown => CAUSE_SYSTEM,
        };
        match self
            .cause
            .compare_exchange(CAUSE_NONE, raw, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => tracing::info!(?cause, "shutdown requested"),
            Err(_) => tracing::debug!(?cause, "shutdown already in progress, cause ignored"),
        }
    }

    pub fn is_requested(&self) -> bool {
        self.cause.load(Ordering::SeqCst) != CAUSE_NONE
    }

    /// The winning cause, if a stop has been requested
    pub fn cause(&self) -> Option<ShutdownCause> {
        match self.cause.load(Ordering::SeqCst) {
            CAUSE_NORMAL => Some(ShutdownCause::Normal),
            CAUSE_USER => Some(ShutdownCause::UserInterrupt),
            CAUSE_SYSTEM => Some(ShutdownCause::SystemShutdown),
            _ => None,
        }
    }

    /// Drain and run the cleanup callbacks. A second call is a no-op, and
    /// one failing callback does not stop the rest.
    pub fn run_cleanups(&self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            tracing::debug!("cleanup already performed, skipping");
            return;
        }
        let callbacks = std::mem::take(&mut *self.cleanups.lock().unwrap());
        for (name, f) in callbacks {
            if let Err(e) = f() {
                tracing::error!(name, error = %e, "cleanup callback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_first_cause_wins() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.is_requested());
        assert_eq!(coordinator.cause(), None);

        coordinator.request(ShutdownCause::UserInterrupt);
        coordinator.request(ShutdownCause::SystemShutdown);

        assert!(coordinator.is_requested());
        assert_eq!(coordinator.cause(), Some(ShutdownCause::UserInterrupt));
    }

    #[test]
    fn test_cleanups_run_exactly_once() {
        let coordinator = ShutdownCoordinator::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        coordinator.register_cleanup("counter", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        coordinator.run_cleanups();
        coordinator.run_cleanups();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_cleanup_does_not_stop_the_rest() {
        let coordinator = ShutdownCoordinator::new();
        let count = Arc::new(AtomicUsize::new(0));

        coordinator.register_cleanup("broken", || {
            Err(crate::error::Error::Config("boom".into()))
        });
        let c = count.clone();
        coordinator.register_cleanup("counter", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        coordinator.run_cleanups();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let coordinator = ShutdownCoordinator::new();
        let handle = coordinator.clone();

        handle.request(ShutdownCause::SystemShutdown);
        assert_eq!(coordinator.cause(), Some(ShutdownCause::SystemShutdown));
    }

    #[test]
    fn test_cause_maps_to_activity_kind() {
        assert_eq!(
            ShutdownCause::Normal.activity_kind(),
            ActivityKind::NormalShutdown
        );
        assert_eq!(
            ShutdownCause::UserInterrupt.activity_kind(),
            ActivityKind::UserInterrupt
        );
        assert_eq!(
            ShutdownCause::SystemShutdown.activity_kind(),
            ActivityKind::SystemShutdown
        );
    }
}
