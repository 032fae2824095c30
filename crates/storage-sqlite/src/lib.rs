//! SQLite storage implementation for Nexus.
//!
//! This crate implements the durable record store contract of `nexus-core`
//! using Diesel ORM with SQLite:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - The `SqliteRecordStore` and `SqliteSearchHistory` repositories
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies
//! exist. The engine works with the `RecordStore` and
//! `SearchHistoryRepository` traits.
//!
//! ```text
//! nexus-core (ResolutionPipeline)
//!          │
//!          ▼  RecordStore
//!  storage-sqlite (this crate)
//!          │
//!          ▼
//!      SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod history;
pub mod records;
pub mod schema;

pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool};
pub use errors::{IntoCore, StorageError};
pub use history::SqliteSearchHistory;
pub use records::SqliteRecordStore;

pub use nexus_core::errors::{DatabaseError, Error, Result};
