use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use log::warn;

use nexus_registry::{CanonicalRecord, Identifier};

use super::RecordStore;
use crate::errors::Result;

/// [`RecordStore`] held in process memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, CanonicalRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|poisoned| {
                warn!("Record store lock poisoned, recovering");
                poisoned.into_inner()
            })
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, identifier: &Identifier) -> Result<Option<CanonicalRecord>> {
        let records = self.records.read().unwrap_or_else(|poisoned| {
            warn!("Record store lock poisoned, recovering");
            poisoned.into_inner()
        });
        Ok(records.get(&identifier.key()).cloned())
    }

    async fn put(&self, identifier: &Identifier, record: &CanonicalRecord) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|poisoned| {
            warn!("Record store lock poisoned, recovering");
            poisoned.into_inner()
        });
        records.insert(identifier.key(), record.clone());
        Ok(())
    }

    async fn delete(&self, identifier: &Identifier) -> Result<bool> {
        let mut records = self.records.write().unwrap_or_else(|poisoned| {
            warn!("Record store lock poisoned, recovering");
            poisoned.into_inner()
        });
        Ok(records.remove(&identifier.key()).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }
}
