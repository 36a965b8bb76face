use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::grid::ParameterPair;

use super::types::TrialOutcome;

/// Runs one trial to completion.
///
/// Implementations must never fail past this boundary: launch errors,
/// nonzero exits, timeouts and capture errors all become a `TrialOutcome`.
/// `interrupt` fires only when the sweep is cancelled with kill-on-cancel
/// enabled; executors should stop their process and report
/// `ProcessStatus::Interrupted`.
#[async_trait]
pub trait TrialExecutor: Send + Sync {
    fn name(&self) -> &str;
    async fn execute(&self, pair: ParameterPair, interrupt: CancellationToken) -> TrialOutcome;
}
