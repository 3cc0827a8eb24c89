//! Storage module for advertisement records

pub mod persistence;
pub mod store;

pub use persistence::{JsonFileStore, StorageError, StorageStats, StoreConfig};
pub use store::{MemoryRecordStore, RecordStore};
