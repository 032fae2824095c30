//! SQLite storage for canonical records.

mod model;
mod repository;

pub use model::RecordDB;
pub use repository::SqliteRecordStore;
