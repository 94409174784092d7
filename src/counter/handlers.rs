//! Page context and load-time handlers
//!
//! `PageContext` bundles everything a page's counter touches: its
//! records in the store, the document it renders into, the clock, the
//! policy, and the random source. Every operation reads, modifies, and
//! writes the stored count without any transaction, so two contexts on
//! the same page identity can lose each other's updates.

use crate::counter::clock::{Clock, SystemClock};
use crate::counter::error::CounterResult;
use crate::counter::format::{render_text, DEFAULT_SUFFIX};
use crate::counter::policy::{IncrementPolicy, Tick};
use crate::render::{Renderer, Selector};
use crate::storage::{KeyValueStore, PageId, ViewStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Result of the reload handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Milliseconds since the previous load (or since epoch on first load)
    pub elapsed_ms: i64,
    pub increment: u64,
    pub views: u64,
}

/// Result of the elapsed-time handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchUpOutcome {
    pub elapsed_ms: i64,
    pub intervals: u64,
    /// Zero when no whole interval elapsed
    pub increment: u64,
    /// Count after catch-up, `None` if nothing was applied
    pub views: Option<u64>,
}

/// Everything one open page needs to drive its counter
pub struct PageContext {
    views: ViewStore,
    renderer: Arc<dyn Renderer>,
    selector: Selector,
    suffix: String,
    clock: Arc<dyn Clock>,
    policy: IncrementPolicy,
    rng: StdRng,
}

impl PageContext {
    /// Create a context with the system clock, default policy, and an
    /// OS-seeded random source
    pub fn new(store: Arc<dyn KeyValueStore>, page: PageId, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            views: ViewStore::new(store, page),
            renderer,
            selector: Selector::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
            clock: Arc::new(SystemClock),
            policy: IncrementPolicy::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Builder method: set the clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder method: set the increment policy
    pub fn policy(mut self, policy: IncrementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder method: make every draw reproducible
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Builder method: set the target element selector
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Builder method: set the text after the formatted count
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn page(&self) -> &PageId {
        self.views.page()
    }

    pub fn view_store(&self) -> &ViewStore {
        &self.views
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Current count, seeding it from the policy on first access
    pub fn get_views(&mut self) -> CounterResult<u64> {
        let policy = &self.policy;
        let rng = &mut self.rng;
        Ok(self.views.get_views(|| policy.seed_views(rng))?)
    }

    /// Add `increment` to the stored count and render the new value
    pub fn update_post_views(&mut self, increment: u64) -> CounterResult<u64> {
        let current = self.get_views()?;
        let views = current.saturating_add(increment);
        self.views.set_views(views)?;

        let text = render_text(views, &self.suffix);
        if !self.renderer.render(&self.selector, &text)? {
            tracing::trace!(page = %self.page(), "No {} element to render into", self.selector);
        }

        tracing::debug!(page = %self.page(), increment, views, "Updated view count");
        Ok(views)
    }

    /// Draw the next updater cycle
    pub fn next_tick(&mut self) -> Tick {
        self.policy.choose_interval_and_increment(&mut self.rng)
    }

    /// Count one page load
    ///
    /// A load within the reload threshold of the previous one adds the
    /// quick-reload increment; anything later (or a first load) adds one
    /// draw from the delayed-reload set. `now_ms` becomes the new
    /// last-reload time.
    pub fn handle_page_reload(&mut self, now_ms: i64) -> CounterResult<ReloadOutcome> {
        let last_reload = self.views.last_reload()?.unwrap_or(0);
        let elapsed_ms = now_ms.saturating_sub(last_reload);

        let increment = self.policy.reload_increment(elapsed_ms, &mut self.rng);
        let views = self.update_post_views(increment)?;
        self.views.set_last_reload(now_ms)?;

        tracing::info!(page = %self.page(), elapsed_ms, increment, views, "Page reload counted");

        Ok(ReloadOutcome {
            elapsed_ms,
            increment,
            views,
        })
    }

    /// Add views for the time since the last catch-up
    ///
    /// The first call for a page only records `now_ms`. Later calls add
    /// whole elapsed intervals times a single increment draw.
    pub fn handle_time_based_increment(&mut self, now_ms: i64) -> CounterResult<CatchUpOutcome> {
        let last_update = self
            .views
            .last_update()?
            .filter(|&t| t != 0)
            .unwrap_or(now_ms);
        let elapsed_ms = now_ms.saturating_sub(last_update);

        let intervals = self.policy.catch_up_intervals(elapsed_ms);
        let increment = self.policy.catch_up_increment(elapsed_ms, &mut self.rng);

        let views = if intervals > 0 {
            Some(self.update_post_views(increment)?)
        } else {
            None
        };
        self.views.set_last_update(now_ms)?;

        if intervals > 0 {
            tracing::info!(page = %self.page(), elapsed_ms, intervals, increment, "Caught up views");
        }

        Ok(CatchUpOutcome {
            elapsed_ms,
            intervals,
            increment,
            views,
        })
    }
}
