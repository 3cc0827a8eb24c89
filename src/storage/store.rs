//! Record store interface and in-memory backend

use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::persistence::StorageError;
use crate::core::Outpoint;
use crate::lookup::{AttributeFilter, UhrpRecord};

/// Backing store for advertisement records, keyed by outpoint
///
/// Each call is atomic with respect to its key. Results of [`RecordStore::find`]
/// are ordered by outpoint.
pub trait RecordStore: Send + Sync {
    /// Insert or overwrite the record at its outpoint
    fn upsert(&self, record: UhrpRecord) -> Result<(), StorageError>;

    /// Remove the record at `outpoint`; returns whether one existed
    fn delete(&self, outpoint: &Outpoint) -> Result<bool, StorageError>;

    fn find_by_outpoint(&self, outpoint: &Outpoint) -> Result<Option<UhrpRecord>, StorageError>;

    fn find(&self, filter: &AttributeFilter) -> Result<Vec<UhrpRecord>, StorageError>;

    fn len(&self) -> Result<usize, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

/// In-memory record store (for testing and ephemeral nodes)
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<Outpoint, UhrpRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`
    pub fn from_records(records: impl IntoIterator<Item = UhrpRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.outpoint(), record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn upsert(&self, record: UhrpRecord) -> Result<(), StorageError> {
        self.records.write().insert(record.outpoint(), record);
        Ok(())
    }

    fn delete(&self, outpoint: &Outpoint) -> Result<bool, StorageError> {
        Ok(self.records.write().remove(outpoint).is_some())
    }

    fn find_by_outpoint(&self, outpoint: &Outpoint) -> Result<Option<UhrpRecord>, StorageError> {
        Ok(self.records.read().get(outpoint).cloned())
    }

    fn find(&self, filter: &AttributeFilter) -> Result<Vec<UhrpRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.records.read().len())
    }
}
