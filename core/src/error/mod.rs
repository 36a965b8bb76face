#[allow(clippy::module_inception)]
pub mod error;
pub mod record;
pub mod scheduler;

pub use error::{CliError, ConfigError, SweepError};
pub use record::RecordError;
pub use scheduler::SchedulerError;
