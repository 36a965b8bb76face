use std::path::PathBuf;

use sweep_core::api::{
    run_sweep, AppConfig, ArtifactLayout, CliError, SchedulerConfig, SweepArgs,
};
use tokio_util::sync::CancellationToken;

use crate::commands::cli::RunArgs;

/// Exit code when the sweep was stopped by Ctrl-C.
pub const EXIT_CANCELLED: i32 = 130;

/// Fold `run` flags into the loaded config. Flags win over file and env.
pub fn apply_run_args(cfg: &mut AppConfig, args: &RunArgs) {
    if let Some(w) = args.workers {
        cfg.scheduler.max_workers = w;
    }
    if let Some(bin) = args.solver_bin.as_deref().filter(|b| !b.trim().is_empty()) {
        cfg.solver.bin = bin.to_string();
    }
    if let Some(v) = args.i_min {
        cfg.grid.i_min = v;
    }
    if let Some(v) = args.i_max {
        cfg.grid.i_max = v;
    }
    if let Some(v) = args.j_min {
        cfg.grid.j_min = v;
    }
    if let Some(v) = args.j_max {
        cfg.grid.j_max = v;
    }
    if let Some(t) = args.timeout_secs {
        cfg.solver.timeout_secs = t;
    }
    if let Some(dir) = args.output_dir.as_deref() {
        cfg.output.directory = dir.to_string();
    }
    if args.kill_on_cancel {
        cfg.scheduler.kill_on_cancel = true;
    }
    if args.no_progress {
        cfg.scheduler.progress_bar = false;
    }
}

pub async fn run_app_with_config(cfg: AppConfig) -> Result<i32, CliError> {
    let grid = cfg
        .grid
        .to_spec()
        .map_err(|e| CliError::Config(e.to_string()))?;
    let executor = sweep_plugins::factory::build_executor(&cfg.solver)?;

    let workers = cfg.scheduler.effective_workers();
    tracing::info!(
        solver = %cfg.solver.bin,
        workers,
        output = %PathBuf::from(&cfg.output.directory).display(),
        "starting sweep"
    );

    let cancel = CancellationToken::new();
    let watcher = spawn_ctrl_c(cancel.clone());

    let result = run_sweep(SweepArgs {
        grid,
        executor,
        layout: ArtifactLayout::from_config(&cfg.output),
        scheduler: SchedulerConfig {
            max_workers: workers,
            kill_on_cancel: cfg.scheduler.kill_on_cancel,
        },
        progress_every: cfg.scheduler.progress_every,
        progress_bar: cfg.scheduler.progress_bar,
        cancel: cancel.clone(),
    })
    .await;
    watcher.abort();
    let report = result?;

    println!("{}", report.render_text());

    if cancel.is_cancelled() || report.was_cancelled() {
        tracing::warn!(
            cancelled = report.cancelled,
            "sweep interrupted before every pair was dispatched"
        );
        return Ok(EXIT_CANCELLED);
    }
    Ok(0)
}

pub fn show_config(cfg: &AppConfig) -> Result<i32, CliError> {
    let text = toml::to_string_pretty(cfg).map_err(|e| CliError::Command(e.to_string()))?;
    print!("{text}");
    Ok(0)
}

fn spawn_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Ctrl-C received, no further trials will start");
                cancel.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    })
}
