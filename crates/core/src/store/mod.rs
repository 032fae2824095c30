//! Durable record store.
//!
//! The store keeps the latest canonical record per identifier. Implementations
//! live in storage crates; [`MemoryRecordStore`] backs tests and store-less
//! deployments.

mod memory_store;
mod store_traits;

pub use memory_store::MemoryRecordStore;
pub use store_traits::RecordStore;
