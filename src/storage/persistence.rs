//! File-backed record store
//!
//! Keeps the full record set in memory and rewrites a JSON file after every
//! mutation (temp file + atomic rename), with optional rotating backups.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use thiserror::Error;

use super::store::RecordStore;
use crate::core::Outpoint;
use crate::lookup::{AttributeFilter, UhrpRecord};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub records_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".uhrp_data"),
            records_file: "uhrp_records.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Record store persisted as a JSON file
pub struct JsonFileStore {
    config: StoreConfig,
    records: Mutex<BTreeMap<Outpoint, UhrpRecord>>,
}

impl JsonFileStore {
    /// Open the store, loading existing records if the file exists
    pub fn open(config: StoreConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;

        let path = config.data_dir.join(&config.records_file);
        let records = if path.exists() {
            let reader = BufReader::new(fs::File::open(&path)?);
            let records: Vec<UhrpRecord> = serde_json::from_reader(reader)?;
            log::debug!("Loaded {} UHRP records from {:?}", records.len(), path);
            records.into_iter().map(|r| (r.outpoint(), r)).collect()
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            config,
            records: Mutex::new(records),
        })
    }

    /// Get the records file path
    fn records_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.records_file)
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.records_file, index))
    }

    /// Write the record set to disk; caller holds the records lock
    fn persist(&self, records: &BTreeMap<Outpoint, UhrpRecord>) -> Result<(), StorageError> {
        let path = self.records_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.records_file));
        let writer = BufWriter::new(fs::File::create(&temp_path)?);
        let records: Vec<&UhrpRecord> = records.values().collect();
        serde_json::to_writer_pretty(writer, &records)?;

        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.records_path();
        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            record_count: self.records.lock().len(),
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

impl RecordStore for JsonFileStore {
    fn upsert(&self, record: UhrpRecord) -> Result<(), StorageError> {
        let mut records = self.records.lock();
        let outpoint = record.outpoint();
        let previous = records.insert(outpoint.clone(), record);

        if let Err(e) = self.persist(&records) {
            // Keep memory in step with disk
            match previous {
                Some(previous) => records.insert(outpoint, previous),
                None => records.remove(&outpoint),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, outpoint: &Outpoint) -> Result<bool, StorageError> {
        let mut records = self.records.lock();
        let Some(removed) = records.remove(outpoint) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&records) {
            records.insert(outpoint.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }

    fn find_by_outpoint(&self, outpoint: &Outpoint) -> Result<Option<UhrpRecord>, StorageError> {
        Ok(self.records.lock().get(outpoint).cloned())
    }

    fn find(&self, filter: &AttributeFilter) -> Result<Vec<UhrpRecord>, StorageError> {
        Ok(self
            .records
            .lock()
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.records.lock().len())
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub record_count: usize,
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(output_index: u32) -> UhrpRecord {
        UhrpRecord {
            txid: "cd".repeat(32),
            output_index,
            uhrp_url: "url".to_string(),
            host_identity_key: "02".repeat(33),
            hosted_file_location: "https://host/file".to_string(),
            expiry_time: 1000,
            file_size: 2048,
        }
    }

    fn config(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();

        let store = JsonFileStore::open(config(&temp_dir)).unwrap();
        store.upsert(record(0)).unwrap();
        store.upsert(record(1)).unwrap();
        assert!(store.delete(&Outpoint::new("cd".repeat(32), 0)).unwrap());
        drop(store);

        let reopened = JsonFileStore::open(config(&temp_dir)).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(
            reopened
                .find_by_outpoint(&Outpoint::new("cd".repeat(32), 1))
                .unwrap(),
            Some(record(1))
        );
    }

    #[test]
    fn test_delete_of_absent_record_does_not_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(config(&temp_dir)).unwrap();

        assert!(!store.delete(&Outpoint::new("ff", 0)).unwrap());
        assert_eq!(store.stats().unwrap().file_size, 0);
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(StoreConfig {
            max_backups: 3,
            ..config(&temp_dir)
        })
        .unwrap();

        for i in 0..6 {
            store.upsert(record(i)).unwrap();
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.record_count, 6);
        assert_eq!(stats.backup_count, 3);
    }
}
