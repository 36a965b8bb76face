//! Sweep coordinator: owns the run aggregate and drives one scheduler run
//! from artifact preparation to the final report.

mod progress;
mod run;

pub use progress::ProgressMonitor;
pub use run::{run_sweep, SweepArgs};
