use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::{AxisRange, GridSpec, DEFAULT_AXIS_MAX};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "sweep_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Closed bounds of both sweep axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub i_min: i64,
    #[serde(default = "default_axis_max")]
    pub i_max: i64,
    #[serde(default)]
    pub j_min: i64,
    #[serde(default = "default_axis_max")]
    pub j_max: i64,
}

fn default_axis_max() -> i64 {
    DEFAULT_AXIS_MAX
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            i_min: 0,
            i_max: default_axis_max(),
            j_min: 0,
            j_max: default_axis_max(),
        }
    }
}

impl GridConfig {
    pub fn to_spec(&self) -> Result<GridSpec, ConfigError> {
        GridSpec::new(
            AxisRange::new("i", self.i_min, self.i_max)?,
            AxisRange::new("j", self.j_min, self.j_max)?,
        )
    }
}

/// How the external solver is invoked for one pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_solver_bin")]
    pub bin: String,

    /// Fixed flags placed before the per-pair overrides.
    #[serde(default = "default_solver_args")]
    pub args: Vec<String>,

    #[serde(default = "default_define_flag")]
    pub define_flag: String,

    #[serde(default = "default_param_i")]
    pub param_i: String,

    #[serde(default = "default_param_j")]
    pub param_j: String,

    /// Model file appended last. Empty means none.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub workdir: Option<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Substring of stdout treated as "solution found".
    #[serde(default = "default_solution_marker")]
    pub solution_marker: String,

    /// Per-trial hard timeout. 0 disables it.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_solver_bin() -> String {
    "minizinc".to_string()
}

fn default_solver_args() -> Vec<String> {
    ["--solver", "cp-sat", "--parallel", "2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_define_flag() -> String {
    "-D".to_string()
}

fn default_param_i() -> String {
    "unknown_bit_position_i".to_string()
}

fn default_param_j() -> String {
    "unknown_bit_position_j".to_string()
}

fn default_model() -> String {
    "SAND_128_with_i_and_j.mzn".to_string()
}

pub fn default_solution_marker() -> String {
    "----------".to_string()
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            bin: default_solver_bin(),
            args: default_solver_args(),
            define_flag: default_define_flag(),
            param_i: default_param_i(),
            param_j: default_param_j(),
            model: default_model(),
            workdir: None,
            env: BTreeMap::new(),
            solution_marker: default_solution_marker(),
            timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Maximum trials in flight. 0 means one per detected CPU.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Kill in-flight solver processes when the sweep is cancelled.
    #[serde(default)]
    pub kill_on_cancel: bool,

    /// Emit a progress log line every N completions.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_max_workers() -> usize {
    16
}

fn default_progress_every() -> usize {
    100
}

fn default_progress_bar() -> bool {
    true
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            kill_on_cancel: false,
            progress_every: default_progress_every(),
            progress_bar: default_progress_bar(),
        }
    }
}

impl SchedulerSettings {
    pub fn effective_workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_workers
        }
    }
}

/// Artifact locations, relative to `directory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,

    #[serde(default = "default_trial_dir")]
    pub trial_dir: String,

    #[serde(default = "default_solutions_log")]
    pub solutions_log: String,

    #[serde(default = "default_progress_csv")]
    pub progress_csv: String,

    #[serde(default = "default_summary_csv")]
    pub summary_csv: String,

    #[serde(default = "default_summary_json")]
    pub summary_json: String,
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_trial_dir() -> String {
    "result".to_string()
}

fn default_solutions_log() -> String {
    "solutions_summary.txt".to_string()
}

fn default_progress_csv() -> String {
    "results_progress.csv".to_string()
}

fn default_summary_csv() -> String {
    "results_summary.csv".to_string()
}

fn default_summary_json() -> String {
    "summary.json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            trial_dir: default_trial_dir(),
            solutions_log: default_solutions_log(),
            progress_csv: default_progress_csv(),
            summary_csv: default_summary_csv(),
            summary_json: default_summary_json(),
        }
    }
}
