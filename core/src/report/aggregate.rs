use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::grid::ParameterPair;
use crate::scheduler::TrialEvent;

pub const CANCELLED_LABEL: &str = "cancelled";

/// Final classification of one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub pair: ParameterPair,
    pub process_succeeded: bool,
    pub solution_found: bool,
    pub elapsed_seconds: f64,
    /// Short status label, or `cancelled` for pairs never dispatched.
    pub status: String,
    pub detail: String,
    pub exit_code: Option<i32>,
    pub persist_error: Option<String>,
}

/// Run-wide counters. Owned and mutated only by the coordinator, which
/// feeds it every event coming out of the scheduler.
#[derive(Debug, Default)]
pub struct RunAggregate {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub solutions: usize,
    pub cancelled: usize,
    pub busy: Duration,
    records: BTreeMap<ParameterPair, TrialRecord>,
}

impl RunAggregate {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, event: TrialEvent) {
        let pair = event.pair();
        if self.records.contains_key(&pair) {
            tracing::error!(pair = %pair, "duplicate terminal event ignored");
            return;
        }

        let record = match event {
            TrialEvent::Completed(c) => {
                let o = c.outcome;
                self.completed += 1;
                self.busy += o.elapsed;
                if o.process_succeeded() {
                    self.succeeded += 1;
                } else {
                    self.failed += 1;
                }
                if o.solution_found {
                    self.solutions += 1;
                }
                TrialRecord {
                    pair,
                    process_succeeded: o.process_succeeded(),
                    solution_found: o.solution_found,
                    elapsed_seconds: o.elapsed_seconds(),
                    status: o.status.label().to_string(),
                    detail: o.status.to_string(),
                    exit_code: o.exit_code(),
                    persist_error: c.persist_error,
                }
            }
            TrialEvent::Cancelled(pair) => {
                self.cancelled += 1;
                TrialRecord {
                    pair,
                    process_succeeded: false,
                    solution_found: false,
                    elapsed_seconds: 0.0,
                    status: CANCELLED_LABEL.to_string(),
                    detail: "not dispatched".to_string(),
                    exit_code: None,
                    persist_error: None,
                }
            }
        };
        self.records.insert(pair, record);
    }

    /// Pairs that reached a terminal state, completed or cancelled.
    pub fn terminal(&self) -> usize {
        self.records.len()
    }

    /// Records in canonical grid order.
    pub fn records(&self) -> impl Iterator<Item = &TrialRecord> {
        self.records.values()
    }

    pub fn get(&self, pair: ParameterPair) -> Option<&TrialRecord> {
        self.records.get(&pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Completion;
    use crate::trial::{ProcessStatus, TrialOutcome};

    fn completed(i: i64, j: i64, code: i32, solution: bool) -> TrialEvent {
        TrialEvent::Completed(Completion {
            outcome: TrialOutcome {
                pair: ParameterPair::new(i, j),
                status: ProcessStatus::Exited { code },
                elapsed: Duration::from_secs(2),
                stdout: String::new(),
                stderr: String::new(),
                solution_found: solution,
                invocation: String::new(),
            },
            persist_error: None,
        })
    }

    #[test]
    fn counts_follow_both_axes_independently() {
        let mut agg = RunAggregate::new(4);
        agg.apply(completed(1, 1, 0, false));
        agg.apply(completed(0, 0, 0, true));
        agg.apply(completed(1, 0, 2, true));
        agg.apply(TrialEvent::Cancelled(ParameterPair::new(0, 1)));

        assert_eq!(agg.completed, 3);
        assert_eq!(agg.succeeded, 2);
        assert_eq!(agg.failed, 1);
        assert_eq!(agg.solutions, 2);
        assert_eq!(agg.cancelled, 1);
        assert_eq!(agg.busy, Duration::from_secs(6));

        let order: Vec<_> = agg.records().map(|r| r.pair).collect();
        assert_eq!(
            order,
            vec![
                ParameterPair::new(0, 0),
                ParameterPair::new(0, 1),
                ParameterPair::new(1, 0),
                ParameterPair::new(1, 1),
            ]
        );
        assert_eq!(agg.get(ParameterPair::new(1, 0)).unwrap().exit_code, Some(2));
    }

    #[test]
    fn duplicate_events_do_not_double_count() {
        let mut agg = RunAggregate::new(1);
        agg.apply(completed(0, 0, 0, false));
        agg.apply(completed(0, 0, 0, false));
        assert_eq!(agg.completed, 1);
        assert_eq!(agg.terminal(), 1);
    }
}
