mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{parse_progress_csv, parse_solutions_log, Behavior, SyntheticExecutor};
use sweep_core::api::{
    ArtifactLayout, AxisRange, GridSpec, ResultRecorder, Scheduler, SchedulerConfig,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn simultaneous_completions_never_interleave_records() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(
        ResultRecorder::prepare(ArtifactLayout::under(dir.path()))
            .await
            .unwrap(),
    );
    let layout = recorder.layout().clone();

    // Large bodies make a torn write visible if appends were not serialized.
    let body = format!("{}\n----------\n", "x = 123456789;\n".repeat(2_000));
    let executor = Arc::new(
        SyntheticExecutor::new(Behavior::Exit {
            code: 0,
            stdout: body.clone(),
        })
        .with_barrier(50),
    );

    let grid = GridSpec::new(
        AxisRange::new("i", 0, 4).unwrap(),
        AxisRange::new("j", 0, 9).unwrap(),
    )
    .unwrap();
    let scheduler = Scheduler::new(
        executor,
        recorder,
        SchedulerConfig {
            max_workers: 50,
            kill_on_cancel: false,
        },
    )
    .unwrap();

    let mut handle = scheduler.start(grid.pairs());
    while handle.next_event().await.is_some() {}
    handle.finish().await.unwrap();

    let records = parse_solutions_log(&std::fs::read_to_string(&layout.solutions_log).unwrap());
    assert_eq!(records.len(), 50);
    assert!(records.iter().all(|(_, _, stdout)| *stdout == body));
    let keys: HashSet<_> = records.iter().map(|(i, j, _)| (*i, *j)).collect();
    assert_eq!(keys.len(), 50);

    let rows = parse_progress_csv(&std::fs::read_to_string(&layout.progress_csv).unwrap());
    assert_eq!(rows.len(), 50);
    assert!(rows.iter().all(|r| r.2 == 1));
}
