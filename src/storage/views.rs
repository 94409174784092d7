//! Per-page view counter records
//!
//! A page identity owns three keys in the store:
//!
//! ```text
//! <path>              → views (decimal u64)
//! <path>-last-reload  → epoch milliseconds of the last page load
//! <path>-last-update  → epoch milliseconds of the last catch-up
//! ```
//!
//! Values that are missing or do not parse as decimal integers are
//! treated as absent.

use crate::storage::error::StorageResult;
use crate::storage::kv::KeyValueStore;
use std::fmt;
use std::sync::Arc;

const LAST_RELOAD_SUFFIX: &str = "-last-reload";
const LAST_UPDATE_SUFFIX: &str = "-last-update";

/// Identity of a page, taken verbatim from its URL path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key holding the view count
    pub fn views_key(&self) -> String {
        self.0.clone()
    }

    /// Key holding the last page-load timestamp
    pub fn last_reload_key(&self) -> String {
        format!("{}{}", self.0, LAST_RELOAD_SUFFIX)
    }

    /// Key holding the last catch-up timestamp
    pub fn last_update_key(&self) -> String {
        format!("{}{}", self.0, LAST_UPDATE_SUFFIX)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accessor for one page's counter records in a shared store
#[derive(Clone)]
pub struct ViewStore {
    store: Arc<dyn KeyValueStore>,
    page: PageId,
}

impl ViewStore {
    pub fn new(store: Arc<dyn KeyValueStore>, page: PageId) -> Self {
        Self { store, page }
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    /// Current view count, seeding it on first access
    ///
    /// When no parseable count is stored, `seed` is called once and
    /// its value is persisted before being returned.
    pub fn get_views(&self, seed: impl FnOnce() -> u64) -> StorageResult<u64> {
        if let Some(views) = self.peek_views()? {
            return Ok(views);
        }

        let views = seed();
        tracing::debug!(page = %self.page, views, "Seeding view count");
        self.set_views(views)?;
        Ok(views)
    }

    /// Current view count without seeding
    pub fn peek_views(&self) -> StorageResult<Option<u64>> {
        Ok(self
            .store
            .get(&self.page.views_key())?
            .as_deref()
            .and_then(parse_u64))
    }

    pub fn set_views(&self, views: u64) -> StorageResult<()> {
        self.store.set(&self.page.views_key(), &views.to_string())
    }

    /// Timestamp of the last page load, in epoch milliseconds
    pub fn last_reload(&self) -> StorageResult<Option<i64>> {
        self.read_timestamp(&self.page.last_reload_key())
    }

    pub fn set_last_reload(&self, now_ms: i64) -> StorageResult<()> {
        self.store
            .set(&self.page.last_reload_key(), &now_ms.to_string())
    }

    /// Timestamp of the last catch-up, in epoch milliseconds
    pub fn last_update(&self) -> StorageResult<Option<i64>> {
        self.read_timestamp(&self.page.last_update_key())
    }

    pub fn set_last_update(&self, now_ms: i64) -> StorageResult<()> {
        self.store
            .set(&self.page.last_update_key(), &now_ms.to_string())
    }

    fn read_timestamp(&self, key: &str) -> StorageResult<Option<i64>> {
        Ok(self.store.get(key)?.as_deref().and_then(parse_i64))
    }
}

fn parse_u64(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn parse_i64(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
