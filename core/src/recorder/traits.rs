use async_trait::async_trait;

use crate::error::RecordError;
use crate::trial::TrialOutcome;

/// Receives every outcome on the worker that produced it.
///
/// Called concurrently from many workers; implementations own their
/// synchronization.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn record(&self, outcome: &TrialOutcome) -> Result<(), RecordError>;
}
