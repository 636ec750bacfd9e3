//! Key-value store implementations.

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// In-memory store for tests and ephemeral sessions.
///
/// Nothing survives the process; a new key is generated every run.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, id: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("poisoned lock".into()))?;
        Ok(entries.get(id).cloned())
    }

    fn set_string(&self, id: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("poisoned lock".into()))?;
        entries.insert(id.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one file per id under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Storage(format!("failed to create data dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, id: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(id)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    fn set_string(&self, id: &str, value: &str) -> Result<()> {
        std::fs::write(self.path_for(id), value).map_err(|e| Error::Storage(e.to_string()))
    }
}
