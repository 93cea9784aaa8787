//! Error types for deskwatch-core

use thiserror::Error;

/// Main error type for the deskwatch-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for deskwatch-core
pub type Result<T> = std::result::Result<T, Error>;
