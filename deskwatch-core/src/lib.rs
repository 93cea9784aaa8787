//! # deskwatch-core
//!
//! Core library for deskwatch - a single-workstation activity tracker.
//!
//! This library provides:
//! - Domain types for activity events, heartbeats, intervals, and sessions
//! - Database storage layer with SQLite
//! - Platform probes for idle time, screen lock, and window focus
//! - The tracker loop with crash recovery and shutdown coordination
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! A single serial loop polls the platform probe on a fixed cadence and
//! persists three timelines:
//! - **Activity events:** append-only state transitions (lock, idle, shutdown)
//! - **Window intervals:** focus periods with a configurable duration threshold
//! - **Working sessions:** spans derived from the activity stream
//!
//! Heartbeats written alongside let the next run complete anything a crash
//! left open.
//!
//! ## Example
//!
//! ```rust,no_run
//! use deskwatch_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&config.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use probe::{Probe, ProbeError, SystemProbe};
pub use tracker::{ShutdownCause, ShutdownCoordinator, TrackerRunner};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod probe;
pub mod tracker;
pub mod types;
