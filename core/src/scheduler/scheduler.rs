use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::SchedulerError;
use crate::grid::ParameterPair;
use crate::recorder::OutcomeSink;
use crate::trial::{TrialExecutor, TrialOutcome};

use super::types::{Completion, DispatchStats, ProgressCounter, SchedulerConfig, TrialEvent};

/// Bounded worker pool over an ordered sequence of pairs.
pub struct Scheduler {
    executor: Arc<dyn TrialExecutor>,
    sink: Arc<dyn OutcomeSink>,
    config: SchedulerConfig,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        executor: Arc<dyn TrialExecutor>,
        sink: Arc<dyn OutcomeSink>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        if config.max_workers == 0 {
            return Err(SchedulerError::ZeroWorkers);
        }
        Ok(Self {
            executor,
            sink,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an externally owned cancellation token (e.g. wired to Ctrl-C).
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn the dispatch loop. Pairs are admitted in iteration order as
    /// permits free up; events arrive in completion order.
    pub fn start<I>(self, pairs: I) -> SchedulerHandle
    where
        I: IntoIterator<Item = ParameterPair>,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let permits = Arc::new(Semaphore::new(self.config.max_workers));
        let progress = ProgressCounter::default();

        tracing::info!(
            executor = self.executor.name(),
            max_workers = self.config.max_workers,
            kill_on_cancel = self.config.kill_on_cancel,
            "scheduler started"
        );

        let dispatch = tokio::spawn(dispatch_loop(DispatchInput {
            pairs: pairs.into_iter(),
            executor: self.executor,
            sink: self.sink,
            permits: permits.clone(),
            kill_on_cancel: self.config.kill_on_cancel,
            cancel: self.cancel.clone(),
            tx,
            progress: progress.clone(),
        }));

        SchedulerHandle {
            events: rx,
            progress,
            permits,
            max_workers: self.config.max_workers,
            cancel: self.cancel,
            dispatch,
        }
    }
}

/// Coordinator-side view of a running scheduler.
pub struct SchedulerHandle {
    events: mpsc::UnboundedReceiver<TrialEvent>,
    progress: ProgressCounter,
    permits: Arc<Semaphore>,
    max_workers: usize,
    cancel: CancellationToken,
    dispatch: JoinHandle<Result<DispatchStats, SchedulerError>>,
}

impl SchedulerHandle {
    /// Next terminal event; `None` once every pair has been reported.
    pub async fn next_event(&mut self) -> Option<TrialEvent> {
        self.events.recv().await
    }

    pub fn progress(&self) -> ProgressCounter {
        self.progress.clone()
    }

    pub fn completed(&self) -> usize {
        self.progress.get()
    }

    /// Trials currently holding a worker slot.
    pub fn in_flight(&self) -> usize {
        self.max_workers - self.permits.available_permits()
    }

    /// Stop admitting new pairs. Already dispatched trials still report.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the dispatch loop and all workers to wind down.
    pub async fn finish(self) -> Result<DispatchStats, SchedulerError> {
        drop(self.events);
        self.dispatch
            .await
            .map_err(|e| SchedulerError::Dispatch(e.to_string()))?
    }
}

struct DispatchInput<P> {
    pairs: P,
    executor: Arc<dyn TrialExecutor>,
    sink: Arc<dyn OutcomeSink>,
    permits: Arc<Semaphore>,
    kill_on_cancel: bool,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<TrialEvent>,
    progress: ProgressCounter,
}

async fn dispatch_loop<P>(input: DispatchInput<P>) -> Result<DispatchStats, SchedulerError>
where
    P: Iterator<Item = ParameterPair>,
{
    let DispatchInput {
        mut pairs,
        executor,
        sink,
        permits,
        kill_on_cancel,
        cancel,
        tx,
        progress,
    } = input;

    let mut stats = DispatchStats::default();
    let mut workers: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();

    while let Some(pair) = pairs.next() {
        // Cancellation wins ties so nothing is admitted after it fires.
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = permits.clone().acquire_owned() => {
                Some(permit.map_err(|_| SchedulerError::SemaphoreClosed)?)
            }
        };

        let Some(permit) = permit else {
            for skipped in std::iter::once(pair).chain(pairs.by_ref()) {
                stats.cancelled += 1;
                let _ = tx.send(TrialEvent::Cancelled(skipped));
            }
            tracing::info!(cancelled = stats.cancelled, "dispatch stopped by cancellation");
            break;
        };

        stats.dispatched += 1;
        tracing::debug!(pair = %pair, "trial dispatched");

        let interrupt = if kill_on_cancel {
            cancel.child_token()
        } else {
            CancellationToken::new()
        };

        workers.push(tokio::spawn(run_worker(WorkerInput {
            pair,
            executor: executor.clone(),
            sink: sink.clone(),
            interrupt,
            tx: tx.clone(),
            progress: progress.clone(),
            permit,
        })));

        while let Some(Some(joined)) = workers.next().now_or_never() {
            log_worker_exit(joined);
        }
    }

    drop(tx);
    while let Some(joined) = workers.next().await {
        log_worker_exit(joined);
    }

    tracing::info!(
        dispatched = stats.dispatched,
        cancelled = stats.cancelled,
        "dispatch finished"
    );
    Ok(stats)
}

fn log_worker_exit(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "worker task failed");
    }
}

struct WorkerInput {
    pair: ParameterPair,
    executor: Arc<dyn TrialExecutor>,
    sink: Arc<dyn OutcomeSink>,
    interrupt: CancellationToken,
    tx: mpsc::UnboundedSender<TrialEvent>,
    progress: ProgressCounter,
    permit: OwnedSemaphorePermit,
}

async fn run_worker(input: WorkerInput) {
    let WorkerInput {
        pair,
        executor,
        sink,
        interrupt,
        tx,
        progress,
        permit,
    } = input;

    let started = Instant::now();
    // A panicking executor still yields exactly one outcome for its pair.
    let outcome = match tokio::spawn(async move { executor.execute(pair, interrupt).await }).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(pair = %pair, error = %e, "executor task failed");
            TrialOutcome::internal_failure(
                pair,
                started.elapsed(),
                format!("executor task failed: {e}"),
            )
        }
    };

    // A panicking sink still lets the outcome reach the coordinator.
    let persist_error = match AssertUnwindSafe(sink.record(&outcome)).catch_unwind().await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            tracing::warn!(pair = %pair, error = %e, "failed to persist trial outcome");
            Some(e.to_string())
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::error!(pair = %pair, reason = %reason, "outcome sink panicked");
            Some(format!("recorder panicked: {reason}"))
        }
    };

    progress.increment();
    let _ = tx.send(TrialEvent::Completed(Completion {
        outcome,
        persist_error,
    }));
    drop(permit);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::trial::ProcessStatus;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoExecutor;

    #[async_trait]
    impl TrialExecutor for EchoExecutor {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, pair: ParameterPair, _interrupt: CancellationToken) -> TrialOutcome {
            TrialOutcome {
                pair,
                status: ProcessStatus::Exited { code: 0 },
                elapsed: Duration::ZERO,
                stdout: String::new(),
                stderr: String::new(),
                solution_found: false,
                invocation: String::new(),
            }
        }
    }

    struct PanicOn(ParameterPair);

    #[async_trait]
    impl TrialExecutor for PanicOn {
        fn name(&self) -> &str {
            "panic"
        }

        async fn execute(&self, pair: ParameterPair, interrupt: CancellationToken) -> TrialOutcome {
            if pair == self.0 {
                panic!("executor bug");
            }
            EchoExecutor.execute(pair, interrupt).await
        }
    }

    struct NullSink;

    #[async_trait]
    impl OutcomeSink for NullSink {
        async fn record(&self, _outcome: &TrialOutcome) -> Result<(), RecordError> {
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl OutcomeSink for FailingSink {
        async fn record(&self, _outcome: &TrialOutcome) -> Result<(), RecordError> {
            Err(RecordError::Encode {
                what: "row",
                reason: "disk full".into(),
            })
        }
    }

    struct PanickingSink;

    #[async_trait]
    impl OutcomeSink for PanickingSink {
        async fn record(&self, outcome: &TrialOutcome) -> Result<(), RecordError> {
            if outcome.pair.j == 1 {
                panic!("disk vanished");
            }
            Ok(())
        }
    }

    fn pairs(n: i64) -> Vec<ParameterPair> {
        (0..n).map(|j| ParameterPair::new(0, j)).collect()
    }

    async fn drain(mut handle: SchedulerHandle) -> (Vec<TrialEvent>, DispatchStats) {
        let mut events = Vec::new();
        while let Some(ev) = handle.next_event().await {
            events.push(ev);
        }
        let stats = handle.finish().await.unwrap();
        (events, stats)
    }

    #[test]
    fn zero_workers_is_rejected() {
        let res = Scheduler::new(
            Arc::new(EchoExecutor),
            Arc::new(NullSink),
            SchedulerConfig {
                max_workers: 0,
                kill_on_cancel: false,
            },
        );
        assert!(matches!(res, Err(SchedulerError::ZeroWorkers)));
    }

    #[tokio::test]
    async fn every_pair_completes_once() {
        let scheduler = Scheduler::new(
            Arc::new(EchoExecutor),
            Arc::new(NullSink),
            SchedulerConfig::default(),
        )
        .unwrap();
        let handle = scheduler.start(pairs(40));
        let progress = handle.progress();

        let (events, stats) = drain(handle).await;
        assert_eq!(events.len(), 40);
        assert_eq!(stats.dispatched, 40);
        assert_eq!(progress.get(), 40);

        let mut seen: Vec<_> = events.iter().map(TrialEvent::pair).collect();
        seen.sort();
        assert_eq!(seen, pairs(40));
    }

    #[tokio::test]
    async fn executor_panic_becomes_internal_outcome() {
        let bad = ParameterPair::new(0, 2);
        let scheduler = Scheduler::new(
            Arc::new(PanicOn(bad)),
            Arc::new(NullSink),
            SchedulerConfig::default(),
        )
        .unwrap();

        let (events, _) = drain(scheduler.start(pairs(4))).await;
        assert_eq!(events.len(), 4);
        let broken = events
            .iter()
            .find_map(|ev| match ev {
                TrialEvent::Completed(c) if c.outcome.pair == bad => Some(c),
                _ => None,
            })
            .unwrap();
        assert!(matches!(
            broken.outcome.status,
            ProcessStatus::Internal { .. }
        ));
    }

    #[tokio::test]
    async fn persistence_failure_is_carried_not_fatal() {
        let scheduler = Scheduler::new(
            Arc::new(EchoExecutor),
            Arc::new(FailingSink),
            SchedulerConfig::default(),
        )
        .unwrap();

        let (events, stats) = drain(scheduler.start(pairs(3))).await;
        assert_eq!(stats.dispatched, 3);
        assert!(events.iter().all(|ev| matches!(
            ev,
            TrialEvent::Completed(Completion {
                persist_error: Some(_),
                ..
            })
        )));
    }

    #[tokio::test]
    async fn cancelled_before_start_dispatches_nothing() {
        let scheduler = Scheduler::new(
            Arc::new(EchoExecutor),
            Arc::new(NullSink),
            SchedulerConfig::default(),
        )
        .unwrap();
        scheduler.cancel_token().cancel();

        let (events, stats) = drain(scheduler.start(pairs(5))).await;
        assert_eq!(
            stats,
            DispatchStats {
                dispatched: 0,
                cancelled: 5
            }
        );
        assert!(events
            .iter()
            .all(|ev| matches!(ev, TrialEvent::Cancelled(_))));
    }

    #[tokio::test]
    async fn sink_panic_still_delivers_the_outcome() {
        let scheduler = Scheduler::new(
            Arc::new(EchoExecutor),
            Arc::new(PanickingSink),
            SchedulerConfig {
                max_workers: 2,
                kill_on_cancel: false,
            },
        )
        .unwrap();

        let (events, stats) = drain(scheduler.start(pairs(3))).await;
        assert_eq!(stats.dispatched, 3);
        assert_eq!(events.len(), 3);

        let failed: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                TrialEvent::Completed(c) => c.persist_error.as_ref().map(|e| (c.outcome.pair, e)),
                TrialEvent::Cancelled(_) => None,
            })
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, ParameterPair::new(0, 1));
        assert_eq!(failed[0].1, "recorder panicked: disk vanished");
    }
}
