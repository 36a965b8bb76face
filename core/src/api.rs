//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `sweep_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load, load_default, AppConfig, GridConfig, LoggingConfig, OutputConfig, SchedulerSettings,
    SolverConfig,
};
pub use crate::error::{CliError, ConfigError, RecordError, SchedulerError, SweepError};
pub use crate::grid::{AxisRange, GridSpec, ParameterPair, DEFAULT_AXIS_MAX};
pub use crate::recorder::{ArtifactLayout, OutcomeSink, ResultRecorder};
pub use crate::report::{RunAggregate, SweepReport, TrialRecord};
pub use crate::scheduler::{
    Completion, DispatchStats, ProgressCounter, Scheduler, SchedulerConfig, SchedulerHandle,
    TrialEvent,
};
pub use crate::sweep::{run_sweep, SweepArgs};
pub use crate::trial::{ProcessStatus, SolutionMarker, TrialExecutor, TrialOutcome};
