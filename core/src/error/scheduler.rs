use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("max_workers must be at least 1")]
    ZeroWorkers,

    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    #[error("dispatch loop failed: {0}")]
    Dispatch(String),
}
