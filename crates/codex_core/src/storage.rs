//! Client-side key/value storage and the validated decoding boundary.
//!
//! Two stores exist: a durable [`FileStore`] (survives restarts, holds the
//! user session and viewed-snippet ids) and a volatile [`MemoryStore`]
//! (lives as long as the process, holds the admin key). Everything read back
//! goes through [`load_json`], which never panics on bad data.

use crate::error::StoreError;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// String key/value storage shared between services.
pub trait ClientStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Result of reading a typed value from a [`ClientStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored<T> {
    Absent,
    /// A value was present but did not decode; it has been removed.
    Invalid,
    Present(T),
}

impl<T> Stored<T> {
    pub fn present(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

/// Decode a JSON value stored under `key`.
///
/// Undecodable values are dropped from the store so the next read reports
/// [`Stored::Absent`].
pub fn load_json<T: DeserializeOwned>(store: &dyn ClientStore, key: &str) -> Stored<T> {
    let Some(raw) = store.get(key) else {
        return Stored::Absent;
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Stored::Present(value),
        Err(err) => {
            warn!(key = key, "discarding invalid stored value: {}", err);
            if let Err(remove_err) = store.remove(key) {
                warn!(key = key, "failed to remove invalid stored value: {}", remove_err);
            }
            Stored::Invalid
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_json<T: Serialize>(
    store: &dyn ClientStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

fn lock_entries(
    entries: &Mutex<BTreeMap<String, String>>,
) -> MutexGuard<'_, BTreeMap<String, String>> {
    match entries.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("client store mutex was poisoned; continuing with last written state");
            poisoned.into_inner()
        }
    }
}

/// Volatile in-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock_entries(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock_entries(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock_entries(&self.entries).remove(key);
        Ok(())
    }
}

/// Durable store backed by a single JSON object on disk.
///
/// Every write rewrites the file through a temp file + rename so a crash
/// never leaves a half-written document behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file yields an empty store. A corrupt file is logged and
    /// treated as empty; it is replaced on the next write.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), "ignoring corrupt client state file: {}", err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ClientStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock_entries(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock_entries(&self.entries);
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock_entries(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
