use std::process::ExitStatus;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sweep_core::api::{ParameterPair, ProcessStatus, SolutionMarker, TrialExecutor, TrialOutcome};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::capture::CaptureBuffer;
use super::command::SolverCommand;
use super::io_pump::pump;

/// How long to keep draining stdout/stderr after the process is gone.
/// Grandchildren can hold the pipes open; whatever arrived is kept.
const CAPTURE_GRACE: Duration = Duration::from_secs(2);

/// Runs the external solver once per pair.
pub struct SolverExecutor {
    command: SolverCommand,
    marker: SolutionMarker,
    timeout: Option<Duration>,
}

impl SolverExecutor {
    pub fn new(command: SolverCommand, marker: SolutionMarker, timeout: Option<Duration>) -> Self {
        Self {
            command,
            marker,
            timeout,
        }
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }
}

enum WaitEnd {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Interrupted,
}

#[async_trait]
impl TrialExecutor for SolverExecutor {
    fn name(&self) -> &str {
        "solver"
    }

    async fn execute(&self, pair: ParameterPair, interrupt: CancellationToken) -> TrialOutcome {
        let invocation = self.command.describe(pair);
        tracing::debug!(pair = %pair, command = %invocation, "running solver");
        let started = Instant::now();

        let mut child = match self.command.build(pair).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(pair = %pair, error = %e, "solver launch failed");
                let reason = e.to_string();
                return TrialOutcome {
                    pair,
                    status: ProcessStatus::LaunchFailed {
                        reason: reason.clone(),
                    },
                    elapsed: started.elapsed(),
                    stdout: String::new(),
                    stderr: reason,
                    solution_found: false,
                    invocation,
                };
            }
        };

        let stdout = CaptureBuffer::new();
        let stderr = CaptureBuffer::new();
        let out_pump = child
            .stdout
            .take()
            .map(|rd| pump(rd, stdout.clone(), "stdout"));
        let err_pump = child
            .stderr
            .take()
            .map(|rd| pump(rd, stderr.clone(), "stderr"));

        let end = tokio::select! {
            res = child.wait() => WaitEnd::Exited(res),
            _ = deadline(self.timeout) => WaitEnd::TimedOut,
            _ = interrupt.cancelled() => WaitEnd::Interrupted,
        };

        let status = match end {
            WaitEnd::Exited(Ok(st)) => classify_exit(st),
            WaitEnd::Exited(Err(e)) => ProcessStatus::Internal {
                reason: format!("wait failed: {e}"),
            },
            WaitEnd::TimedOut => {
                stop(&mut child, pair).await;
                ProcessStatus::TimedOut {
                    limit_ms: self.timeout.unwrap_or_default().as_millis() as u64,
                }
            }
            WaitEnd::Interrupted => {
                stop(&mut child, pair).await;
                ProcessStatus::Interrupted
            }
        };
        let elapsed = started.elapsed();

        let notes = drain(out_pump, err_pump).await;
        for note in &notes {
            tracing::warn!(pair = %pair, note = %note, "incomplete output capture");
        }

        let stdout = stdout.to_string_lossy();
        let mut stderr = stderr.to_string_lossy();
        for note in notes {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!("[sweep] {note}\n"));
        }

        let solution_found = self.marker.detect(&stdout);
        tracing::debug!(
            pair = %pair,
            status = %status,
            solution = solution_found,
            elapsed_secs = elapsed.as_secs_f64(),
            "solver finished"
        );

        TrialOutcome {
            pair,
            status,
            elapsed,
            stdout,
            stderr,
            solution_found,
            invocation,
        }
    }
}

async fn deadline(limit: Option<Duration>) {
    match limit {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

fn classify_exit(status: ExitStatus) -> ProcessStatus {
    match status.code() {
        Some(code) => ProcessStatus::Exited { code },
        None => ProcessStatus::Signaled,
    }
}

async fn stop(child: &mut Child, pair: ParameterPair) {
    if let Err(e) = child.kill().await {
        tracing::warn!(pair = %pair, error = %e, "failed to kill solver");
    }
}

type Pump = Option<JoinHandle<std::io::Result<u64>>>;

/// Wait for both pumps to reach EOF, sharing one grace period. Returns a
/// note per stream whose capture was cut short.
async fn drain(mut stdout: Pump, mut stderr: Pump) -> Vec<String> {
    let joined = tokio::time::timeout(CAPTURE_GRACE, async {
        tokio::join!(settle(stdout.as_mut()), settle(stderr.as_mut()))
    })
    .await;

    match joined {
        Ok((out, err)) => [("stdout", out), ("stderr", err)]
            .into_iter()
            .filter_map(|(label, res)| res.map(|reason| format!("{label} {reason}")))
            .collect(),
        Err(_) => [("stdout", stdout), ("stderr", stderr)]
            .into_iter()
            .filter_map(|(label, handle)| {
                let handle = handle?;
                if handle.is_finished() {
                    return None;
                }
                handle.abort();
                Some(format!(
                    "{label} still open {}s after exit, capture truncated",
                    CAPTURE_GRACE.as_secs()
                ))
            })
            .collect(),
    }
}

/// Await one pump. `Some(reason)` when it stopped on an error.
async fn settle(handle: Option<&mut JoinHandle<std::io::Result<u64>>>) -> Option<String> {
    match handle?.await {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(format!("capture failed: {e}")),
        Err(e) => Some(format!("capture task failed: {e}")),
    }
}
