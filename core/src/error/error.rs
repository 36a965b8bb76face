use thiserror::Error;

use super::{RecordError, SchedulerError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("sweep failed: {0}")]
    Sweep(#[from] SweepError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("scheduler failed: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("artifact setup failed: {0}")]
    Record(#[from] RecordError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid axis range {name}: min {min} is greater than max {max}")]
    InvalidAxis { name: &'static str, min: i64, max: i64 },
    #[error("axis {name} from {min} to {max} has too many values")]
    AxisTooWide { name: &'static str, min: i64, max: i64 },
    #[error("grid of {i_len} x {j_len} pairs is too large")]
    GridTooLarge { i_len: usize, j_len: usize },
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("cannot determine home directory")]
    NoHomeDir,
}
