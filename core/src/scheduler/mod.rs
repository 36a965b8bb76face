//! Bounded, cancellable dispatch of trials.
//!
//! ```text
//! pairs (canonical order)
//!   ↓ acquire permit (≤ max_workers held)
//! worker: TrialExecutor::execute → OutcomeSink::record
//!   ↓ TrialEvent over one mpsc channel (completion order)
//! coordinator
//! ```

mod scheduler;
mod types;

pub use scheduler::{Scheduler, SchedulerHandle};
pub use types::{Completion, DispatchStats, ProgressCounter, SchedulerConfig, TrialEvent};
