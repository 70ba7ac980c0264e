//! # Durable Slots
//!
//! A slot is a single named key-value entry holding an entire collection as one
//! encoded blob. It is read whole when an actor starts and rewritten whole after
//! every mutation.
//!
//! Two backends are provided:
//! - [`FileSlotStorage`] keeps each slot in `<dir>/<key>.json`.
//! - [`MemorySlotStorage`] keeps slots in a shared map, for tests and demos.
//!
//! Failures here never reach callers of the store. The actor logs them and
//! publishes a [`PersistenceEvent`] so they stay observable.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on slot {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Slot {key} could not be encoded or decoded: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Slot {0} is unavailable")]
    Unavailable(String),
}

/// Observable outcome of a load or save against a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceEvent {
    Loaded { key: String, count: usize },
    LoadFailed { key: String, error: String },
    Saved { key: String, count: usize },
    SaveFailed { key: String, error: String },
}

/// Backend for durable slots.
pub trait SlotStorage: Send + 'static {
    /// Returns `None` when the slot has never been written.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the whole slot.
    fn write(&mut self, key: &str, blob: &str) -> Result<(), StorageError>;
}

// =============================================================================
// File backend
// =============================================================================

#[derive(Debug, Clone)]
pub struct FileSlotStorage {
    dir: PathBuf,
}

impl FileSlotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn io_error(key: &str, source: std::io::Error) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl SlotStorage for FileSlotStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(blob) => {
                debug!(path = %path.display(), bytes = blob.len(), "Read slot");
                Ok(Some(blob))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(key, e))?;

        // Readers must never observe a half-written blob.
        let path = self.slot_path(key);
        let tmp = tmp_path(&path);
        fs::write(&tmp, blob).map_err(|e| Self::io_error(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::io_error(key, e))?;

        debug!(path = %path.display(), bytes = blob.len(), "Wrote slot");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

// =============================================================================
// Memory backend
// =============================================================================

/// Shared in-memory slots. Clones see the same data, so a test can drop a
/// store and rebuild it from the same backend.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`StorageError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw blob currently held under `key`.
    pub fn blob(&self, key: &str) -> Option<String> {
        self.slots.lock().ok().and_then(|slots| slots.get(key).cloned())
    }

    pub fn seed(&self, key: &str, blob: impl Into<String>) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), blob.into());
        }
    }
}

impl SlotStorage for MemorySlotStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| StorageError::Unavailable(key.to_string()))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(key.to_string()));
        }
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StorageError::Unavailable(key.to_string()))?;
        slots.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slot_missing_then_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileSlotStorage::new(dir.path().join("nested"));

        assert!(storage.read("orders").unwrap().is_none());

        storage.write("orders", "{\"a\":1}").unwrap();
        assert_eq!(storage.read("orders").unwrap().as_deref(), Some("{\"a\":1}"));

        storage.write("orders", "{}").unwrap();
        assert_eq!(storage.read("orders").unwrap().as_deref(), Some("{}"));
        assert!(!tmp_path(&storage.slot_path("orders")).exists());
    }

    #[test]
    fn test_memory_slot_shared_between_clones() {
        let storage = MemorySlotStorage::new();
        let mut writer = storage.clone();

        writer.write("k", "v1").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v1"));

        storage.set_fail_writes(true);
        let err = writer.write("k", "v2").unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(ref key) if key == "k"));
        assert_eq!(storage.blob("k").as_deref(), Some("v1"));
    }
}
