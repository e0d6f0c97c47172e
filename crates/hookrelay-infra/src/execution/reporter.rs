//! Error reporter that logs node failures.

use tracing::error;

use hookrelay_core::execution::{ErrorContext, ErrorReporter};
use hookrelay_types::error::NodeError;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, err: &NodeError, context: &ErrorContext) {
        error!(
            workflow_id = %context.workflow_id,
            node = %context.node_name,
            node_type = %context.node_type,
            node_version = context.node_version,
            description = err.description.as_deref().unwrap_or(""),
            error = %err,
            "trigger node failed"
        );
    }
}
