use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::error::SweepError;
use crate::grid::GridSpec;
use crate::recorder::{ArtifactLayout, ResultRecorder};
use crate::report::{RunAggregate, SweepReport};
use crate::scheduler::{Scheduler, SchedulerConfig, TrialEvent};
use crate::trial::TrialExecutor;

use super::progress::ProgressMonitor;

pub struct SweepArgs {
    pub grid: GridSpec,
    pub executor: Arc<dyn TrialExecutor>,
    pub layout: ArtifactLayout,
    pub scheduler: SchedulerConfig,
    pub progress_every: usize,
    pub progress_bar: bool,
    pub cancel: CancellationToken,
}

/// Evaluate every pair of the grid and write the final artifacts.
///
/// Per-trial failures and persistence failures end up in the report; only
/// artifact preparation and scheduler setup errors are returned.
#[tracing::instrument(name = "sweep.run", skip_all, fields(run_id = tracing::field::Empty))]
pub async fn run_sweep(args: SweepArgs) -> Result<SweepReport, SweepError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("run_id", run_id.as_str());
    let started_at = chrono::Utc::now();
    let clock = Instant::now();

    let recorder = Arc::new(ResultRecorder::prepare(args.layout.clone()).await?);
    let scheduler = Scheduler::new(args.executor, recorder, args.scheduler)?
        .with_cancel(args.cancel);

    let total = args.grid.len();
    tracing::info!(total, "Total combinations to test: {}", total);

    let mut handle = scheduler.start(args.grid.pairs());
    let monitor = ProgressMonitor::new(total, args.progress_every, args.progress_bar);
    let mut aggregate = RunAggregate::new(total);

    while let Some(event) = handle.next_event().await {
        let pair = event.pair();
        let success = match &event {
            TrialEvent::Completed(c) => {
                let o = &c.outcome;
                tracing::debug!(
                    pair = %pair,
                    status = %o.status,
                    solution = o.solution_found,
                    elapsed_secs = o.elapsed_seconds(),
                    "trial completed"
                );
                o.process_succeeded()
            }
            TrialEvent::Cancelled(_) => false,
        };
        aggregate.apply(event);
        monitor.on_trial(pair, success, aggregate.terminal());
    }

    let stats = handle.finish().await?;
    monitor.finish(stats.cancelled > 0);

    let mut report = SweepReport::build(run_id, started_at, clock.elapsed(), &aggregate);

    let layout = &args.layout;
    if let Err(e) = report.write_summary_csv(&layout.summary_csv).await {
        tracing::warn!(error = %e, "failed to write summary csv");
        report.artifact_errors.push(e.to_string());
    }
    if let Err(e) = report.write_json(&layout.summary_json).await {
        tracing::warn!(error = %e, "failed to write summary json");
        report.artifact_errors.push(e.to_string());
    }

    tracing::info!(
        completed = report.completed,
        succeeded = report.succeeded,
        failed = report.failed,
        solutions = report.solutions_found,
        cancelled = report.cancelled,
        "sweep finished"
    );
    Ok(report)
}
