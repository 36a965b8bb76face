use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::grid::ParameterPair;
use crate::trial::TrialOutcome;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upper bound on trials in flight at any instant.
    pub max_workers: usize,
    /// Interrupt in-flight trials when the sweep is cancelled.
    pub kill_on_cancel: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: 16,
            kill_on_cancel: false,
        }
    }
}

/// A dispatched trial that reached its terminal state.
#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: TrialOutcome,
    /// Set when the recorder could not persist this outcome.
    pub persist_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TrialEvent {
    Completed(Completion),
    /// Never dispatched because cancellation fired first.
    Cancelled(ParameterPair),
}

impl TrialEvent {
    pub fn pair(&self) -> ParameterPair {
        match self {
            Self::Completed(c) => c.outcome.pair,
            Self::Cancelled(pair) => *pair,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: usize,
    pub cancelled: usize,
}

/// Monotonic count of completed trials, readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter(Arc<AtomicUsize>);

impl ProgressCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn increment(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}
