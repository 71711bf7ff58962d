//! Key-value persistence for search history and theme preference.
//!
//! Every operation reports failures explicitly; the managers that sit on top
//! decide to fall back to defaults.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::PersistenceError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// In-process store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.lock().map_err(|_| PersistenceError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().map_err(|_| PersistenceError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().map_err(|_| PersistenceError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, re-read on every `get` and rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/photo-search/store.json`, or a relative file if the
    /// platform has no data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("photo-search"))
            .unwrap_or_default()
            .join("store.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    // A corrupt file must not block every later write, so mutations start over.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        match self.read_all() {
            Err(PersistenceError::Malformed(e)) => {
                warn!("Discarding unreadable store {}: {}", self.path.display(), e);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let body = serde_json::to_string_pretty(entries)?;
        // Write beside the target and rename so readers never see a partial file.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("Wrote {} store entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().map_err(|_| PersistenceError::Poisoned)?;
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().map_err(|_| PersistenceError::Poisoned)?;
        let mut entries = self.read_for_update()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}
