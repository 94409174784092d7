//! Wall clock and timer abstractions
//!
//! Handlers read time through `Clock` and the updater waits through
//! `Scheduler`, so tests can drive both by hand.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of epoch-millisecond timestamps
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn advance(&self, by_ms: i64) {
        self.now.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Single-shot delay primitive used between updater ticks
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Returns immediately, advancing a `ManualClock` by the requested delay
///
/// Every requested delay is recorded so tests can inspect the schedule.
#[derive(Debug)]
pub struct ManualScheduler {
    clock: Arc<ManualClock>,
    delays: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            delays: Mutex::new(Vec::new()),
        }
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
        self.clock.advance(delay.as_millis() as i64);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(2_500);
        assert_eq!(clock.now_ms(), 3_500);
    }

    #[test]
    fn test_system_clock_is_epoch_millis() {
        // Any time after 2020-01-01
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn test_manual_scheduler_advances_clock() {
        let clock = Arc::new(ManualClock::new(0));
        let scheduler = ManualScheduler::new(clock.clone());

        scheduler.sleep(Duration::from_millis(2_000)).await;
        scheduler.sleep(Duration::from_millis(11_500)).await;

        assert_eq!(clock.now_ms(), 13_500);
        assert_eq!(
            scheduler.delays(),
            vec![Duration::from_millis(2_000), Duration::from_millis(11_500)]
        );
    }
}
