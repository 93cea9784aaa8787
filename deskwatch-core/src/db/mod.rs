//! Database layer for deskwatch
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for queries
//! - Open-record scans used for crash recovery

pub mod repo;
pub mod schema;

pub use repo::Database;
