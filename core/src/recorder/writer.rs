use std::path::Path;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::RecordError;
use crate::trial::TrialOutcome;

use super::format::{
    render_progress_row, render_solution_record, render_trial_artifact, PROGRESS_CSV_HEADER,
    SOLUTIONS_BANNER,
};
use super::layout::ArtifactLayout;
use super::traits::OutcomeSink;

type AppendHandle = Box<dyn AsyncWrite + Send + Unpin>;

/// Append handles for the two shared artifacts. Only reachable through the
/// recorder's mutex.
struct SharedSinks {
    solutions: AppendHandle,
    progress: AppendHandle,
}

pub struct ResultRecorder {
    layout: ArtifactLayout,
    shared: Mutex<SharedSinks>,
}

impl ResultRecorder {
    /// Create output directories and truncate the shared artifacts, leaving
    /// the solutions banner and the CSV header in place.
    #[tracing::instrument(name = "recorder.prepare", skip_all, fields(root = %layout.root.display()))]
    pub async fn prepare(layout: ArtifactLayout) -> Result<Self, RecordError> {
        for dir in [&layout.root, &layout.trial_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| RecordError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
        }

        let solutions = truncate_with(&layout.solutions_log, SOLUTIONS_BANNER).await?;
        let progress = truncate_with(&layout.progress_csv, PROGRESS_CSV_HEADER).await?;

        Ok(Self::with_handles(
            layout,
            Box::new(solutions),
            Box::new(progress),
        ))
    }

    fn with_handles(layout: ArtifactLayout, solutions: AppendHandle, progress: AppendHandle) -> Self {
        Self {
            layout,
            shared: Mutex::new(SharedSinks {
                solutions,
                progress,
            }),
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Private per-pair file. Names never collide, so no lock is taken.
    pub async fn write_trial_artifact(&self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        let path = self.layout.trial_path(outcome.pair);
        tokio::fs::write(&path, render_trial_artifact(outcome))
            .await
            .map_err(|e| RecordError::write(path, e))
    }

    /// Append to the solutions log (when a solution was found) and to the
    /// progress CSV, holding the shared guard for both writes. The row is
    /// attempted even when the log append fails.
    pub async fn append_shared(&self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        let record = outcome
            .solution_found
            .then(|| render_solution_record(outcome));
        let row = render_progress_row(outcome);

        let mut sinks = self.shared.lock().await;
        let logged = match record {
            Some(record) => {
                write_whole(&mut sinks.solutions, &self.layout.solutions_log, &record).await
            }
            None => Ok(()),
        };
        let appended = write_whole(&mut sinks.progress, &self.layout.progress_csv, &row).await;
        drop(sinks);

        first_error(outcome, logged, appended)
    }
}

#[async_trait]
impl OutcomeSink for ResultRecorder {
    async fn record(&self, outcome: &TrialOutcome) -> Result<(), RecordError> {
        let artifact = self.write_trial_artifact(outcome).await;
        let shared = self.append_shared(outcome).await;
        first_error(outcome, artifact, shared)
    }
}

/// Keep the first error; the second one is only logged.
fn first_error(
    outcome: &TrialOutcome,
    first: Result<(), RecordError>,
    second: Result<(), RecordError>,
) -> Result<(), RecordError> {
    match (first, second) {
        (Err(first), Err(second)) => {
            tracing::warn!(pair = %outcome.pair, error = %second, "additional write failed");
            Err(first)
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

async fn truncate_with(path: &Path, header: &str) -> Result<tokio::fs::File, RecordError> {
    tokio::fs::write(path, header)
        .await
        .map_err(|e| RecordError::write(path, e))?;
    OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|e| RecordError::write(path, e))
}

async fn write_whole(
    file: &mut AppendHandle,
    path: &Path,
    text: &str,
) -> Result<(), RecordError> {
    file.write_all(text.as_bytes())
        .await
        .map_err(|e| RecordError::write(path, e))?;
    file.flush().await.map_err(|e| RecordError::write(path, e))
}
