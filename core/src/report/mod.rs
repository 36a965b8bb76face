mod aggregate;
mod report;

pub use aggregate::{RunAggregate, TrialRecord, CANCELLED_LABEL};
pub use report::{PairFailure, PairTiming, PersistFailure, SweepReport, SUMMARY_CSV_HEADER};
