//! Starting workflow runs from trigger hook results.

pub mod launcher;
pub mod ports;
pub mod prepare;

pub use launcher::{ExecutionLauncher, HookResult, Launched};
pub use ports::{CompletionNotifier, ErrorContext, ErrorReporter, ExecutionRunner, WaitTracker};
pub use prepare::{build_run_request, prepare_execution_data};
