mod traits;
pub mod types;

pub use traits::TrialExecutor;
pub use types::{ProcessStatus, SolutionMarker, TrialOutcome};
