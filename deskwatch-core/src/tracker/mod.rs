//! The tracking core: the activity state machine, the window-interval
//! tracker, working-session derivation, heartbeats, shutdown coordination,
//! and the fixed-cadence runner that drives them.
//!
//! All components are constructor-injected with their probe and database
//! handles; the only mutable in-memory state is the state machine's current
//! state and the window tracker's open-interval handle.

pub mod activity;
pub mod heartbeat;
pub mod runner;
pub mod session;
pub mod shutdown;
pub mod window;

pub use activity::{ActivityState, ActivityStateMachine};
pub use heartbeat::HeartbeatTask;
pub use runner::TrackerRunner;
pub use session::SessionDeriver;
pub use shutdown::{ShutdownCause, ShutdownCoordinator};
pub use window::WindowIntervalTracker;
