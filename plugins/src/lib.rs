//! Concrete trial executors for the sweep harness.

pub mod factory;
pub mod runner;
