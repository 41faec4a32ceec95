use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::models::{ScratchpadItem, Session};

pub const SESSIONS_KEY: &str = "devcognition_sessions";
pub const SCRATCHPAD_KEY: &str = "devcognition_scratchpad";

/// String-keyed store of JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn load_raw(&self, key: &str) -> Option<String>;

    /// Moves whatever is stored under `key` out of the way, so the next save
    /// does not overwrite it.
    fn set_aside(&self, key: &str) -> Result<(), StorageError>;
}

pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    store.save_raw(key, &json)
}

/// Loads `key`, treating missing or unreadable data as empty. Unreadable
/// data is kept under `<key>.corrupt`.
pub fn load<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let Some(raw) = store.load_raw(key) else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Setting aside unreadable data under '{}': {}", key, e);
        if let Err(e) = store.set_aside(key) {
            error!("Failed to set aside '{}': {}", key, e);
        }
        T::default()
    })
}

pub fn save_sessions(store: &dyn KeyValueStore, sessions: &[Session]) -> Result<(), StorageError> {
    save(store, SESSIONS_KEY, sessions)
}

pub fn load_sessions(store: &dyn KeyValueStore) -> Vec<Session> {
    load(store, SESSIONS_KEY)
}

pub fn save_scratchpad(store: &dyn KeyValueStore, items: &[ScratchpadItem]) -> Result<(), StorageError> {
    save(store, SCRATCHPAD_KEY, items)
}

pub fn load_scratchpad(store: &dyn KeyValueStore) -> Vec<ScratchpadItem> {
    load(store, SCRATCHPAD_KEY)
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for FileStore {
    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Readers only ever see a complete file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved '{}' to {}", key, path.display());
        Ok(())
    }

    fn load_raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set_aside(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let aside = path.with_extension("json.corrupt");
        fs::rename(&path, &aside)?;
        warn!("Moved {} to {}", path.display(), aside.display());
        Ok(())
    }
}

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
    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load_raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_aside(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = entries.remove(key) {
            entries.insert(format!("{}.corrupt", key), value);
        }
        Ok(())
    }
}
