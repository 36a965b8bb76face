//! Core of the solver parameter sweep: grid enumeration, the trial model,
//! the bounded scheduler, artifact recording and final reporting.

pub mod api;
pub mod config;
pub mod error;
pub mod grid;
pub mod recorder;
pub mod report;
pub mod scheduler;
pub mod sweep;
pub mod trial;
