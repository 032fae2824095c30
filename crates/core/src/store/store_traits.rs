//! Record store traits.

use async_trait::async_trait;

use nexus_registry::{CanonicalRecord, Identifier};

use crate::errors::Result;

/// Storage interface for canonical records.
///
/// Records are keyed by [`Identifier::key`]. Writing a record for an
/// identifier that is already stored replaces it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Latest stored record for `identifier`, if any.
    async fn get(&self, identifier: &Identifier) -> Result<Option<CanonicalRecord>>;

    /// Insert or replace the record for `identifier`.
    async fn put(&self, identifier: &Identifier, record: &CanonicalRecord) -> Result<()>;

    /// Remove the record for `identifier`. Returns whether one was stored.
    async fn delete(&self, identifier: &Identifier) -> Result<bool>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64>;
}
