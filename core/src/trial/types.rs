use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::grid::ParameterPair;

/// How the solver process ended. Failures are ordinary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Ran to completion with this exit code (0 is success).
    Exited { code: i32 },
    /// Terminated by a signal, no exit code available.
    Signaled,
    /// The process could not be started at all.
    LaunchFailed { reason: String },
    /// Killed after exceeding the per-trial limit.
    TimedOut { limit_ms: u64 },
    /// Killed because the sweep was cancelled.
    Interrupted,
    /// Output capture or the executor itself broke down.
    Internal { reason: String },
}

impl ProcessStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exited { code: 0 } => "ok",
            Self::Exited { .. } => "exit",
            Self::Signaled => "signaled",
            Self::LaunchFailed { .. } => "launch_failed",
            Self::TimedOut { .. } => "timed_out",
            Self::Interrupted => "interrupted",
            Self::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code } => write!(f, "exited with code {code}"),
            Self::Signaled => write!(f, "terminated by signal"),
            Self::LaunchFailed { reason } => write!(f, "launch failed: {reason}"),
            Self::TimedOut { limit_ms } => write!(f, "timed out after {limit_ms}ms"),
            Self::Interrupted => write!(f, "interrupted by cancellation"),
            Self::Internal { reason } => write!(f, "internal error: {reason}"),
        }
    }
}

/// Result of one trial. Created once by an executor, consumed once by the
/// recorder and the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub pair: ParameterPair,
    pub status: ProcessStatus,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
    pub solution_found: bool,
    /// Human-readable command line, for artifacts.
    pub invocation: String,
}

impl TrialOutcome {
    /// Whether the process exited with status zero. Independent of
    /// `solution_found`.
    pub fn process_succeeded(&self) -> bool {
        matches!(self.status, ProcessStatus::Exited { code: 0 })
    }

    /// Nonzero exit code of a process that ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            ProcessStatus::Exited { code } if code != 0 => Some(code),
            _ => None,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Outcome for a trial whose executor broke down without reporting.
    pub fn internal_failure(pair: ParameterPair, elapsed: Duration, reason: String) -> Self {
        Self {
            pair,
            status: ProcessStatus::Internal { reason },
            elapsed,
            stdout: String::new(),
            stderr: String::new(),
            solution_found: false,
            invocation: String::new(),
        }
    }
}

/// Fixed substring whose presence in stdout counts as a found solution.
///
/// This is a coarse textual check; stderr is never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionMarker(String);

impl SolutionMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn detect(&self, stdout: &str) -> bool {
        !self.0.is_empty() && stdout.contains(&self.0)
    }
}

impl Default for SolutionMarker {
    fn default() -> Self {
        Self::new(crate::config::default_solution_marker())
    }
}
