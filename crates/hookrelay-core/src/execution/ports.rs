//! Execution-side ports: the runner, its completion signal, the wait
//! tracker that resumes paused parents, and the error reporter.

use hookrelay_types::error::{ExecutionError, NodeError};
use hookrelay_types::execution::{ExecutionId, RunRequest};
use hookrelay_types::workflow::WorkflowId;

/// Accepts run requests and starts executions.
pub trait ExecutionRunner: Send + Sync {
    fn submit(
        &self,
        run: RunRequest,
    ) -> impl std::future::Future<Output = Result<ExecutionId, ExecutionError>> + Send;
}

/// Completion signal for started executions.
pub trait CompletionNotifier: Send + Sync {
    /// A future that resolves once the execution has finished, successfully
    /// or not. It does not borrow the notifier so it can outlive the call.
    fn on_complete(
        &self,
        execution_id: &ExecutionId,
    ) -> impl std::future::Future<Output = ()> + Send + 'static;
}

/// Tracks executions paused while waiting on a child.
pub trait WaitTracker: Send + Sync {
    /// Resume a waiting execution.
    fn resume(
        &self,
        execution_id: &ExecutionId,
    ) -> impl std::future::Future<Output = Result<(), ExecutionError>> + Send;
}

/// Where a node failure happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    pub workflow_id: WorkflowId,
    pub node_name: String,
    pub node_type: String,
    pub node_version: f64,
}

/// Receives node failures for out-of-band reporting.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &NodeError, context: &ErrorContext);
}
