//! Persistence Gateway
//!
//! Named JSON blob storage for poll state. Two keys are in use: the current
//! poll snapshot and the poll history. A missing key is a cold start, never
//! an error; a failed save is surfaced so the caller can log it while the
//! in-memory state stays authoritative.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde_json::Value;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur reading or writing a blob
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O failure for blob '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed blob '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Keyed blob store used by the poll engine.
pub trait DataStore: Send + Sync {
    /// Load a named blob. `Ok(None)` when the key has never been saved.
    fn load(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Save a named blob, replacing any previous value.
    fn save(&self, key: &str, value: &Value) -> StorageResult<()>;
}

/// Store persisting each key as a pretty-printed JSON file in one directory.
///
/// The directory is created on first save.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform data directory (`<data dir>/pollbox`).
    pub fn at_default_location() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("pollbox"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DataStore for JsonFileStore {
    fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source: e,
                })
            }
        };

        let value = serde_json::from_str(&text).map_err(|e| StorageError::Malformed {
            key: key.to_string(),
            source: e,
        })?;

        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::Io {
            key: key.to_string(),
            source: e,
        })?;

        let text = serde_json::to_string_pretty(value).map_err(|e| StorageError::Malformed {
            key: key.to_string(),
            source: e,
        })?;

        fs::write(self.path_for(key), text).map_err(|e| StorageError::Io {
            key: key.to_string(),
            source: e,
        })
    }
}

/// In-memory store for tests and hosts that opt out of durability.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataStore for MemoryStore {
    fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        self.blobs.lock().insert(key.to_string(), value.clone());
        Ok(())
    }
}
