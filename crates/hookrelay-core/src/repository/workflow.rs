//! Workflow store trait definition.

use serde_json::Value;

use hookrelay_types::error::RepositoryError;
use hookrelay_types::workflow::{WorkflowId, WorkflowRecord};

/// Read access to stored workflows plus the static-data write-back.
pub trait WorkflowStore: Send + Sync {
    /// Load a workflow with its active version and shares.
    fn find_workflow(
        &self,
        id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowRecord>, RepositoryError>> + Send;

    /// Replace the workflow's static data.
    fn save_static_data(
        &self,
        id: &WorkflowId,
        static_data: &Value,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
