//! Continuous updater
//!
//! While a page stays open its counter keeps growing: draw an interval
//! and an increment, wait, apply, draw again. The loop has no stop
//! condition of its own; it ends when its task is aborted or when a
//! storage or render failure breaks the chain.

use crate::counter::clock::Scheduler;
use crate::counter::error::CounterResult;
use crate::counter::handlers::PageContext;
use crate::counter::policy::Tick;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// What one updater cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub tick: Tick,
    pub views: u64,
}

/// Self-rescheduling view updater for one page
pub struct ContinuousUpdater {
    context: PageContext,
    scheduler: Arc<dyn Scheduler>,
    ticks: u64,
}

impl ContinuousUpdater {
    pub fn new(context: PageContext, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            context,
            scheduler,
            ticks: 0,
        }
    }

    /// Number of completed cycles
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run exactly one cycle: draw, wait, apply
    pub async fn tick(&mut self) -> CounterResult<TickOutcome> {
        let tick = self.context.next_tick();
        self.scheduler
            .sleep(Duration::from_millis(tick.interval_ms))
            .await;

        let views = self.context.update_post_views(tick.increment)?;
        self.ticks += 1;

        tracing::debug!(
            page = %self.context.page(),
            interval_ms = tick.interval_ms,
            increment = tick.increment,
            views,
            "Updater tick"
        );

        Ok(TickOutcome { tick, views })
    }

    /// Cycle until a tick fails
    pub async fn run(mut self) -> CounterResult<()> {
        loop {
            if let Err(e) = self.tick().await {
                tracing::error!(
                    page = %self.context.page(),
                    ticks = self.ticks,
                    "View updater stopped: {}",
                    e
                );
                return Err(e);
            }
        }
    }

    /// Spawn the loop on the tokio runtime
    ///
    /// Aborting the returned handle is the only way to stop a healthy
    /// updater.
    pub fn start(self) -> JoinHandle<CounterResult<()>> {
        tokio::spawn(self.run())
    }
}
