use std::path::PathBuf;

use thiserror::Error;

/// Failures while persisting trial artifacts.
///
/// These never abort a sweep: the recorder reports them and the coordinator
/// lists them in the final report.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },
}

impl RecordError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
