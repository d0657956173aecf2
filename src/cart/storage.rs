//! Durable cart storage
//!
//! A single namespaced record holds the JSON-serialized [`CartState`]. It is
//! read once at startup and rewritten after every mutation.

use super::models::CartState;
use crate::error::StorageError;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Key-value storage for the cart record
pub trait CartStorage: Send + Sync {
    /// Returns the stored cart, or `None` when nothing was saved yet
    fn load(&self) -> Result<Option<CartState>, StorageError>;

    fn save(&self, state: &CartState) -> Result<(), StorageError>;
}

/// Stores the record as `<dir>/<namespace>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{namespace}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<CartState>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &CartState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write then rename so a crash mid-write keeps the previous record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process storage keeping the serialized record in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the storage with a raw record
    pub fn with_record(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw JSON currently stored
    pub fn raw(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<CartState>, StorageError> {
        match self.raw() {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &CartState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)?;
        *self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(raw);
        Ok(())
    }
}
