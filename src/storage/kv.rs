//! Key-value store abstraction
//!
//! Every counter value lives as a decimal string under a string key,
//! the same shape a browser's origin-scoped local storage offers.
//! `MemoryStore` keeps the map in process; see `FileStore` for the
//! persistent backend.

use crate::storage::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// A string-keyed store of string values
///
/// Implementations use interior mutability so one store can be shared
/// between several page sessions through an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// All keys currently present, in sorted order
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Size of one entry as counted against a quota
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// In-memory store with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes growing it past `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota: Some(quota),
        }
    }

    /// Total bytes used by keys and values
    pub fn used_bytes(&self) -> StorageResult<usize> {
        let entries = self.lock()?;
        Ok(entries.iter().map(|(k, v)| entry_size(k, v)).sum())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota {
            let used: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map(|old| entry_size(key, old)).unwrap_or(0);
            let needed = used - replaced + entry_size(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("/posts/a").unwrap(), None);
    }

    #[test]
    fn test_set_and_overwrite() {
        let store = MemoryStore::new();
        store.set("/posts/a", "5000").unwrap();
        assert_eq!(store.get("/posts/a").unwrap().as_deref(), Some("5000"));

        store.set("/posts/a", "5001").unwrap();
        assert_eq!(store.get("/posts/a").unwrap().as_deref(), Some("5001"));
        assert_eq!(store.keys().unwrap(), vec!["/posts/a".to_string()]);
    }

    #[test]
    fn test_quota_rejects_growth() {
        // "/a" + "5000" = 6 bytes
        let store = MemoryStore::with_quota(10);
        store.set("/a", "5000").unwrap();
        assert_eq!(store.used_bytes().unwrap(), 6);

        let err = store.set("/b", "6000").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 12,
                quota: 10,
                ..
            }
        ));

        // The failed write leaves the store untouched
        assert_eq!(store.get("/b").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_replaced_entry_once() {
        let store = MemoryStore::with_quota(6);
        store.set("/a", "5000").unwrap();
        // Same size replacement fits even though the store is full
        store.set("/a", "5001").unwrap();
        assert!(store.set("/a", "50010").is_err());
    }
}
