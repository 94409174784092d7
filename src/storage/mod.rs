//! Viewcount Storage
//!
//! This module provides the persistent side of the counter:
//!
//! - **kv**: The `KeyValueStore` trait and an in-memory store with quota
//! - **file**: JSON-file backed store with atomic writes
//! - **views**: Per-page accessor for views and timestamps
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use viewcount::storage::{FileStore, PageId, ViewStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::open("./views.json")?);
//!     let views = ViewStore::new(store, PageId::new("/posts/hello"));
//!
//!     let current = views.get_views(|| 5000)?;
//!     views.set_views(current + 1)?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file;
pub mod kv;
pub mod views;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use views::{PageId, ViewStore};
