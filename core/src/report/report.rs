use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::error::RecordError;
use crate::grid::ParameterPair;

use super::aggregate::{RunAggregate, TrialRecord};

pub const SUMMARY_CSV_HEADER: &str =
    "pair_i,pair_j,success,solution_found,elapsed_time,status\n";

const LIST_LIMIT: usize = 20;
const RULE: &str =
    "================================================================================";

#[derive(Debug, Clone, Serialize)]
pub struct PairTiming {
    pub pair: ParameterPair,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    pub pair: ParameterPair,
    pub elapsed_seconds: f64,
    pub status: String,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistFailure {
    pub pair: ParameterPair,
    pub error: String,
}

/// Final view of a sweep, built once after every pair is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub run_id: String,
    pub started_at: String,
    pub wall_time_seconds: f64,
    pub busy_time_seconds: f64,
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub solutions_found: usize,
    pub cancelled: usize,
    pub successes: Vec<PairTiming>,
    pub solutions: Vec<ParameterPair>,
    pub failures: Vec<PairFailure>,
    pub cancelled_pairs: Vec<ParameterPair>,
    pub persistence_errors: Vec<PersistFailure>,
    /// Final artifacts (summary CSV / JSON) that could not be written.
    pub artifact_errors: Vec<String>,
    #[serde(skip)]
    pub records: Vec<TrialRecord>,
}

impl SweepReport {
    pub fn build(
        run_id: impl Into<String>,
        started_at: chrono::DateTime<chrono::Utc>,
        wall_time: Duration,
        aggregate: &RunAggregate,
    ) -> Self {
        let records: Vec<TrialRecord> = aggregate.records().cloned().collect();

        let successes = records
            .iter()
            .filter(|r| r.process_succeeded)
            .map(|r| PairTiming {
                pair: r.pair,
                elapsed_seconds: r.elapsed_seconds,
            })
            .collect();
        let solutions = records
            .iter()
            .filter(|r| r.solution_found)
            .map(|r| r.pair)
            .collect();
        let failures = records
            .iter()
            .filter(|r| !r.process_succeeded && r.status != super::CANCELLED_LABEL)
            .map(|r| PairFailure {
                pair: r.pair,
                elapsed_seconds: r.elapsed_seconds,
                status: r.detail.clone(),
                exit_code: r.exit_code,
            })
            .collect();
        let cancelled_pairs = records
            .iter()
            .filter(|r| r.status == super::CANCELLED_LABEL)
            .map(|r| r.pair)
            .collect();
        let persistence_errors = records
            .iter()
            .filter_map(|r| {
                r.persist_error.as_ref().map(|e| PersistFailure {
                    pair: r.pair,
                    error: e.clone(),
                })
            })
            .collect();

        Self {
            run_id: run_id.into(),
            started_at: started_at.to_rfc3339(),
            wall_time_seconds: wall_time.as_secs_f64(),
            busy_time_seconds: aggregate.busy.as_secs_f64(),
            total: aggregate.total,
            completed: aggregate.completed,
            succeeded: aggregate.succeeded,
            failed: aggregate.failed,
            solutions_found: aggregate.solutions,
            cancelled: aggregate.cancelled,
            successes,
            solutions,
            failures,
            cancelled_pairs,
            persistence_errors,
            artifact_errors: Vec::new(),
            records,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}\nSUMMARY\n{RULE}");
        let _ = writeln!(out, "Run id: {}", self.run_id);
        let _ = writeln!(out, "Total execution time: {:.2}s", self.wall_time_seconds);
        let _ = writeln!(out, "Total combinations: {}", self.total);
        let _ = writeln!(out, "Completed: {}", self.completed);
        let _ = writeln!(out, "Successful runs: {}", self.succeeded);
        let _ = writeln!(out, "Failed runs: {}", self.failed);
        let _ = writeln!(out, "Solutions found: {}", self.solutions_found);
        if self.cancelled > 0 {
            let _ = writeln!(out, "Cancelled before dispatch: {}", self.cancelled);
        }

        if !self.successes.is_empty() {
            let _ = writeln!(
                out,
                "\nSuccessful pairs (showing first {}):",
                LIST_LIMIT.min(self.successes.len())
            );
            for s in self.successes.iter().take(LIST_LIMIT) {
                let _ = writeln!(
                    out,
                    "  i={}, j={}: {:.2}s",
                    s.pair.i, s.pair.j, s.elapsed_seconds
                );
            }
            if self.successes.len() > LIST_LIMIT {
                let _ = writeln!(out, "  ... and {} more", self.successes.len() - LIST_LIMIT);
            }
        }

        if !self.failures.is_empty() && self.failures.len() <= LIST_LIMIT {
            let _ = writeln!(out, "\nFailed pairs:");
            for f in &self.failures {
                let _ = writeln!(
                    out,
                    "  i={}, j={}: {} ({:.2}s)",
                    f.pair.i, f.pair.j, f.status, f.elapsed_seconds
                );
            }
        } else if !self.failures.is_empty() {
            let _ = writeln!(
                out,
                "\nFailed runs: {} (too many to display)",
                self.failures.len()
            );
        }

        if !self.persistence_errors.is_empty() {
            let _ = writeln!(
                out,
                "\nArtifacts that could not be written: {}",
                self.persistence_errors.len()
            );
            for p in self.persistence_errors.iter().take(LIST_LIMIT) {
                let _ = writeln!(out, "  i={}, j={}: {}", p.pair.i, p.pair.j, p.error);
            }
        }

        for e in &self.artifact_errors {
            let _ = writeln!(out, "\nSummary artifact not written: {e}");
        }

        out
    }

    /// Every pair's final classification in canonical order.
    pub fn summary_csv(&self) -> String {
        let mut out = String::from(SUMMARY_CSV_HEADER);
        for r in &self.records {
            let _ = writeln!(
                out,
                "{},{},{},{},{:.2},{}",
                r.pair.i,
                r.pair.j,
                u8::from(r.process_succeeded),
                u8::from(r.solution_found),
                r.elapsed_seconds,
                r.status
            );
        }
        out
    }

    pub async fn write_summary_csv(&self, path: &Path) -> Result<(), RecordError> {
        tokio::fs::write(path, self.summary_csv())
            .await
            .map_err(|e| RecordError::write(path, e))
    }

    pub async fn write_json(&self, path: &Path) -> Result<(), RecordError> {
        let body = serde_json::to_string_pretty(self).map_err(|e| RecordError::Encode {
            what: "summary json",
            reason: e.to_string(),
        })?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| RecordError::write(path, e))
    }
}
