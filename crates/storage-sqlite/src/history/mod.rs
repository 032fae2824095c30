//! SQLite storage for the search history.

mod model;
mod repository;

pub use model::{NewSearchDB, SearchDB};
pub use repository::SqliteSearchHistory;
