mod capture;
pub mod command;
mod io_pump;
pub mod solver;

pub use capture::CaptureBuffer;
pub use command::SolverCommand;
pub use solver::SolverExecutor;
