#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sweep_core::api::{ParameterPair, ProcessStatus, SolutionMarker, TrialExecutor, TrialOutcome};
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

/// What a synthetic trial reports.
#[derive(Debug, Clone)]
pub enum Behavior {
    Exit { code: i32, stdout: String },
    LaunchFail,
}

impl Behavior {
    pub fn solved() -> Self {
        Self::Exit {
            code: 0,
            stdout: "x = 1;\n----------\n".into(),
        }
    }

    pub fn unsolved() -> Self {
        Self::Exit {
            code: 0,
            stdout: "=====UNSATISFIABLE=====\n".into(),
        }
    }

    pub fn crashed() -> Self {
        Self::Exit {
            code: 1,
            stdout: String::new(),
        }
    }
}

/// Tracks how many trials are inside `execute` at once.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct SyntheticExecutor {
    default: Behavior,
    overrides: HashMap<ParameterPair, Behavior>,
    delay: Duration,
    barrier: Option<Arc<Barrier>>,
    marker: SolutionMarker,
    pub gauge: Gauge,
    started: Mutex<Vec<ParameterPair>>,
}

impl SyntheticExecutor {
    pub fn new(default: Behavior) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            delay: Duration::ZERO,
            barrier: None,
            marker: SolutionMarker::default(),
            gauge: Gauge::default(),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, pair: (i64, i64), behavior: Behavior) -> Self {
        self.overrides
            .insert(ParameterPair::new(pair.0, pair.1), behavior);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Hold every trial until `n` trials have started.
    pub fn with_barrier(mut self, n: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn started(&self) -> Vec<ParameterPair> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrialExecutor for SyntheticExecutor {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn execute(&self, pair: ParameterPair, interrupt: CancellationToken) -> TrialOutcome {
        let started = Instant::now();
        self.gauge.enter();
        self.started.lock().unwrap().push(pair);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        let interrupted = tokio::select! {
            _ = tokio::time::sleep(self.delay) => false,
            _ = interrupt.cancelled() => true,
        };
        self.gauge.exit();

        let behavior = self.overrides.get(&pair).unwrap_or(&self.default).clone();
        let (status, stdout, stderr) = if interrupted {
            (ProcessStatus::Interrupted, String::new(), String::new())
        } else {
            match behavior {
                Behavior::Exit { code, stdout } => (
                    ProcessStatus::Exited { code },
                    stdout,
                    format!("trial {pair} done\n"),
                ),
                Behavior::LaunchFail => (
                    ProcessStatus::LaunchFailed {
                        reason: "No such file or directory (os error 2)".into(),
                    },
                    String::new(),
                    "No such file or directory (os error 2)".into(),
                ),
            }
        };

        TrialOutcome {
            pair,
            solution_found: self.marker.detect(&stdout),
            status,
            elapsed: started.elapsed(),
            stdout,
            stderr,
            invocation: format!("synthetic -D i={} -D j={}", pair.i, pair.j),
        }
    }
}

/// Parse `pair_i,pair_j,success,elapsed_time` rows, asserting each is well
/// formed.
pub fn parse_progress_csv(text: &str) -> Vec<(i64, i64, u8, f64)> {
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("pair_i,pair_j,success,elapsed_time"));
    lines
        .map(|line| {
            let cols: Vec<&str> = line.split(',').collect();
            assert_eq!(cols.len(), 4, "malformed row: {line:?}");
            (
                cols[0].parse().expect("pair_i"),
                cols[1].parse().expect("pair_j"),
                cols[2].parse().expect("success"),
                cols[3].parse().expect("elapsed_time"),
            )
        })
        .collect()
}

/// Split the solutions log into records, asserting each one has a header,
/// a body and the closing separator.
pub fn parse_solutions_log(text: &str) -> Vec<(i64, i64, String)> {
    let body = text
        .strip_prefix(sweep_core::recorder::SOLUTIONS_BANNER)
        .expect("solutions banner");
    let terminator = format!("\n{}\n\n", sweep_core::recorder::RECORD_SEPARATOR);

    let mut records = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let end = rest.find(&terminator).expect("record separator");
        let record = &rest[..end];
        rest = &rest[end + terminator.len()..];

        let (header, stdout) = record.split_once('\n').expect("record header");
        let coords = header
            .strip_prefix("Pair i=")
            .and_then(|h| h.split_once(": SOLUTION FOUND (time: "))
            .map(|(c, _)| c)
            .expect("record header format");
        let (i, j) = coords.split_once(", j=").expect("pair coordinates");
        records.push((
            i.parse().expect("i"),
            j.parse().expect("j"),
            stdout.to_string(),
        ));
    }
    records
}
