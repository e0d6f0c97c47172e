//! In-process execution adapters: the runner that records and completes
//! runs, completion tracking, parent resumption and error reporting.

pub mod active;
pub mod reporter;
pub mod runner;
pub mod wait;

pub use active::ActiveExecutions;
pub use reporter::TracingErrorReporter;
pub use runner::LocalExecutionRunner;
pub use wait::SqliteWaitTracker;
