//! Persistence of trial outcomes.
//!
//! Each outcome produces one private artifact plus appends to two shared
//! artifacts: the cumulative solutions log and the progress CSV. The shared
//! pair sits behind a single async mutex so records never interleave.

mod format;
mod layout;
mod traits;
mod writer;

pub use format::{
    render_progress_row, render_solution_record, render_trial_artifact, PROGRESS_CSV_HEADER,
    RECORD_SEPARATOR, SOLUTIONS_BANNER,
};
pub use layout::ArtifactLayout;
pub use traits::OutcomeSink;
pub use writer::ResultRecorder;
