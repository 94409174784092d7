//! File-backed key-value store
//!
//! The map is persisted as a single JSON object and cached in memory
//! for reads. Each write re-reads the file, merges in its one key, and
//! replaces the file atomically: the new contents go to a sibling temp
//! file which is then renamed over the original. Keys written by other
//! handles on the same file survive.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv::KeyValueStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Persistent key-value store stored as a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed
    ///
    /// A missing file is an empty store. A file that is not a JSON
    /// object of strings is an error, not an empty store.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries = read_entries(&path)?;

        tracing::debug!("Opened store {:?} with {} keys", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(entries)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.lock()?;

        // The cache is only replaced once the merged map is on disk
        let mut merged = read_entries(&self.path)?;
        merged.insert(key.to_string(), value.to_string());
        self.persist(&merged)?;

        *entries = merged;
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Current contents of the file; missing or blank means empty
fn read_entries(path: &Path) -> StorageResult<BTreeMap<String, String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        Ok(BTreeMap::new())
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}
