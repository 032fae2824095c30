//! Core error types for the Nexus engine.
//!
//! Resolution outcomes use the registry crate's `ResolutionError`, which is
//! what callers see. The types here cover the engine's collaborators and its
//! configuration. Storage-specific errors (SQLite, ...) are converted to
//! `DatabaseError` by the storage layer.

use thiserror::Error;

use nexus_registry::ResolutionError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for durable store operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open or configure the database.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to build the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// Schema migrations could not be applied.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// A stored payload could not be encoded or decoded.
    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Fast cache failures. The pipeline treats every one of them as a miss.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out")]
    Timeout,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ConfigIO(err.to_string())
    }
}
