//! Search history.
//!
//! Every call to [`crate::RiskGraphService`] leaves one [`NewSearch`] behind,
//! successful or not. Storage crates implement [`SearchHistoryRepository`];
//! [`MemorySearchHistory`] keeps a bounded window in process memory.

mod history_model;
mod history_traits;
mod memory_history;

pub use history_model::{NewSearch, SearchRecord, MAX_QUERY_CHARS, OUTCOME_OK};
pub use history_traits::SearchHistoryRepository;
pub use memory_history::MemorySearchHistory;
