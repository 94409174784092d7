//! Page session
//!
//! Opening a page runs the load-time handlers in order, then hands the
//! context to a continuous updater:
//!
//! ```text
//! open:  reload handler → elapsed-time handler → spawn updater
//! close: abort updater
//! ```

use crate::counter::clock::Scheduler;
use crate::counter::error::CounterResult;
use crate::counter::handlers::{CatchUpOutcome, PageContext, ReloadOutcome};
use crate::counter::updater::ContinuousUpdater;
use crate::storage::PageId;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// An open page whose counter keeps ticking until it is closed
pub struct PageSession {
    page: PageId,
    reload: ReloadOutcome,
    catch_up: CatchUpOutcome,
    updater: JoinHandle<CounterResult<()>>,
}

impl PageSession {
    /// Run the startup sequence and start the updater
    ///
    /// Both handlers finish before the updater's first wait begins.
    /// Must be called from within a tokio runtime.
    pub fn open(mut context: PageContext, scheduler: Arc<dyn Scheduler>) -> CounterResult<Self> {
        let page = context.page().clone();

        let reload = context.handle_page_reload(context.now_ms())?;
        let catch_up = context.handle_time_based_increment(context.now_ms())?;

        let updater = ContinuousUpdater::new(context, scheduler).start();
        tracing::info!(%page, views = reload.views, "Page session opened");

        Ok(Self {
            page,
            reload,
            catch_up,
            updater,
        })
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    pub fn reload(&self) -> &ReloadOutcome {
        &self.reload
    }

    pub fn catch_up(&self) -> &CatchUpOutcome {
        &self.catch_up
    }

    /// Count shown right after startup
    pub fn opening_views(&self) -> u64 {
        self.catch_up.views.unwrap_or(self.reload.views)
    }

    /// Whether the updater is still ticking
    pub fn is_running(&self) -> bool {
        !self.updater.is_finished()
    }

    /// Unload the page
    ///
    /// Returns the updater's error if it had already stopped on a failure.
    pub async fn close(self) -> CounterResult<()> {
        self.updater.abort();

        let result = match self.updater.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        };

        tracing::info!(page = %self.page, "Page session closed");
        result
    }

    /// Wait for the updater to stop on its own, which only happens on error
    pub async fn wait(self) -> CounterResult<()> {
        match self.updater.await {
            Ok(result) => result,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::clock::{ManualClock, ManualScheduler};
    use crate::counter::CounterError;
    use crate::render::{MemoryDocument, Selector};
    use crate::storage::{KeyValueStore, MemoryStore, StorageError};

    const T0: i64 = 1_700_000_000_000;

    fn context(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> PageContext {
        let doc = Arc::new(MemoryDocument::with_element(&Selector::default()));
        PageContext::new(store, PageId::new("/posts/a"), doc)
            .clock(clock)
            .seed(17)
    }

    #[tokio::test]
    async fn test_first_visit_startup_sequence() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));

        let session = PageSession::open(context(store.clone(), clock), scheduler.clone()).unwrap();

        // Seeded, then a delayed-reload increment, no catch-up
        let reload = *session.reload();
        assert!([2, 3, 5].contains(&reload.increment));
        assert!([5000, 6000, 7000].contains(&(reload.views - reload.increment)));
        assert_eq!(session.catch_up().views, None);
        assert_eq!(session.opening_views(), reload.views);

        // Startup writes happened before the updater waited once
        assert!(scheduler.delays().is_empty());
        assert_eq!(store.get("/posts/a-last-reload").unwrap(), Some(T0.to_string()));
        assert_eq!(store.get("/posts/a-last-update").unwrap(), Some(T0.to_string()));

        assert!(session.is_running());
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_return_visit_catches_up() {
        let store = Arc::new(MemoryStore::new());
        store.set("/posts/a", "6000").unwrap();
        store.set("/posts/a-last-reload", &T0.to_string()).unwrap();
        store.set("/posts/a-last-update", &T0.to_string()).unwrap();

        // Back one hour later: 1800 catch-up intervals
        let clock = Arc::new(ManualClock::new(T0 + 3_600_000));
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let session = PageSession::open(context(store.clone(), clock), scheduler).unwrap();

        let reload = *session.reload();
        let catch_up = *session.catch_up();
        assert!([2, 3, 5].contains(&reload.increment));
        assert_eq!(catch_up.intervals, 1800);
        assert!(catch_up.increment == 1800 || catch_up.increment == 3600);
        assert_eq!(
            session.opening_views(),
            6000 + reload.increment + catch_up.increment
        );

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_updater_keeps_counting_after_open() {
        let store = Arc::new(MemoryStore::new());
        store.set("/posts/a", "5000").unwrap();
        let clock = Arc::new(ManualClock::new(T0));
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));

        let session = PageSession::open(context(store.clone(), clock), scheduler.clone()).unwrap();
        let opening = session.opening_views();

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        session.close().await.unwrap();

        let ticks = scheduler.delays().len() as u64;
        assert!(ticks > 0);
        let views: u64 = store.get("/posts/a").unwrap().unwrap().parse().unwrap();
        assert!(views >= opening + ticks - 1);
    }

    #[tokio::test]
    async fn test_wait_reports_updater_failure() {
        // Fits the startup writes but not a five digit count
        let store = Arc::new(MemoryStore::new());
        store.set("/posts/a", "9990").unwrap();
        store.set("/posts/a-last-reload", &T0.to_string()).unwrap();
        store.set("/posts/a-last-update", &T0.to_string()).unwrap();
        let quota = store.used_bytes().unwrap();
        let limited = Arc::new(MemoryStore::with_quota(quota));
        for key in store.keys().unwrap() {
            limited.set(&key, &store.get(&key).unwrap().unwrap()).unwrap();
        }

        let clock = Arc::new(ManualClock::new(T0 + 1_000));
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let session = PageSession::open(context(limited, clock), scheduler).unwrap();
        assert_eq!(session.reload().views, 9991);

        let err = session.wait().await.unwrap_err();
        assert!(matches!(
            err,
            CounterError::Storage(StorageError::QuotaExceeded { .. })
        ));
    }
}
