//! Viewcount Counter
//!
//! The moving parts of a page's synthetic view count:
//!
//! - **format**: `5123` → `"5.123k"`
//! - **policy**: Random seeds, reload increments, catch-up, and tick draws
//! - **clock**: Wall clock and timer abstractions (system and manual)
//! - **handlers**: `PageContext` with the reload and elapsed-time handlers
//! - **updater**: The self-rescheduling tick loop
//! - **session**: Startup sequence and page unload
//!
//! # Lifecycle
//!
//! ```text
//! page load:
//!   reload handler    (+1 if reloaded within 30s, else +2/3/5)
//!   elapsed handler   (+floor(elapsed / 2s) × 1|2)
//!   updater loop      (wait 2-10s → +1|2, or 11-20s → +1|2|3; repeat)
//! page unload:
//!   abort updater
//! ```

pub mod clock;
pub mod error;
pub mod format;
pub mod handlers;
pub mod policy;
pub mod session;
pub mod updater;

pub use clock::{Clock, ManualClock, ManualScheduler, Scheduler, SystemClock, TokioScheduler};
pub use error::{CounterError, CounterResult};
pub use format::{format_views, render_text, DEFAULT_SUFFIX};
pub use handlers::{CatchUpOutcome, PageContext, ReloadOutcome};
pub use policy::{Branch, IncrementPolicy, PolicyConfig, Tick};
pub use session::PageSession;
pub use updater::{ContinuousUpdater, TickOutcome};
