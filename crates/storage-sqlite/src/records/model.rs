//! Database model for stored records.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use nexus_registry::{CanonicalRecord, Identifier};

use crate::errors::StorageError;

/// One row per identifier; the record itself is kept as JSON.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::records)]
#[diesel(primary_key(record_key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecordDB {
    pub record_key: String,
    pub country: String,
    pub source_provider: String,
    pub payload: String,
    pub fetched_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RecordDB {
    pub fn encode(identifier: &Identifier, record: &CanonicalRecord) -> Result<Self, StorageError> {
        Ok(Self {
            record_key: identifier.key(),
            country: record.country.code().to_string(),
            source_provider: record.source_provider.clone(),
            payload: serde_json::to_string(record)?,
            fetched_at: record.fetched_at.naive_utc(),
            updated_at: Utc::now().naive_utc(),
        })
    }

    pub fn decode(&self) -> Result<CanonicalRecord, StorageError> {
        serde_json::from_str(&self.payload).map_err(|e| {
            StorageError::Corrupt(format!("record {}: {}", self.record_key, e))
        })
    }
}
