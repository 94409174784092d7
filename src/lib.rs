//! # Viewcount
//!
//! Synthetic page view counter - seeds, grows, and renders a per-page
//! view count kept entirely in a local key-value store.
//!
//! ## Features
//!
//! - **Seeded counts**: A new page starts at 5000, 6000, or 7000 views
//! - **Load-time bumps**: Quick reloads add 1, later visits add 2, 3, or 5
//! - **Catch-up**: Time spent away is paid back in 2 second intervals
//! - **Live ticking**: Random waits of 2-20 seconds add 1-3 views while open
//! - **Pluggable environment**: Store, document, clock, scheduler, and RNG
//!   are all injected
//!
//! ## Modules
//!
//! - [`storage`]: Key-value stores and the per-page record accessor
//! - [`counter`]: Formatting, policy, handlers, updater, and sessions
//! - [`render`]: Documents the count is written into
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use viewcount::counter::{PageContext, PageSession, TokioScheduler};
//! use viewcount::render::HtmlDocument;
//! use viewcount::storage::{FileStore, PageId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::open("./views.json")?);
//!     let page = Arc::new(HtmlDocument::new("./post.html")?);
//!
//!     let context = PageContext::new(store, PageId::new("/posts/hello"), page);
//!     let session = PageSession::open(context, Arc::new(TokioScheduler))?;
//!     println!("Opened at {} views", session.opening_views());
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     session.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod counter;
pub mod render;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, PageId, StorageError, StorageResult, ViewStore,
};

pub use counter::{
    format_views, Clock, ContinuousUpdater, CounterError, CounterResult, IncrementPolicy,
    PageContext, PageSession, PolicyConfig, Scheduler, SystemClock, TokioScheduler,
};

pub use render::{HtmlDocument, MemoryDocument, RenderError, Renderer, Selector};

pub use config::{Config, ConfigError, LoggingConfig, RenderConfig, StoreConfig};
