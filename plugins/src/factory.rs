use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use sweep_core::api::{SolutionMarker, SolverConfig, TrialExecutor};

use crate::runner::{SolverCommand, SolverExecutor};

pub fn build_executor(cfg: &SolverConfig) -> Result<Arc<dyn TrialExecutor>> {
    if cfg.bin.trim().is_empty() {
        bail!("solver.bin must not be empty");
    }
    if cfg.param_i == cfg.param_j {
        bail!(
            "solver.param_i and solver.param_j must differ (both are '{}')",
            cfg.param_i
        );
    }
    if cfg.solution_marker.is_empty() {
        tracing::warn!("solution_marker is empty, no trial will count as solved");
    }

    let timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
    Ok(Arc::new(SolverExecutor::new(
        SolverCommand::from_config(cfg),
        SolutionMarker::new(cfg.solution_marker.clone()),
        timeout,
    )))
}
