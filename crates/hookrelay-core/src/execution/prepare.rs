//! Building execution-ready run data from a hook result.

use std::collections::BTreeMap;

use hookrelay_types::execution::{
    ExecutionErrorInfo, ExecutionMode, NodeItem, ParentExecution, ResultData, RunExecutionData,
    RunRequest, StackEntry,
};
use hookrelay_types::workflow::{WorkflowNode, WorkflowSnapshot};

/// Run data that starts at `node` with the hook's items as its input.
///
/// When `error` is set the run is recorded as failed at that node.
pub fn prepare_execution_data(
    node: &WorkflowNode,
    workflow_data: Vec<Vec<NodeItem>>,
    error: Option<ExecutionErrorInfo>,
    parent_execution: Option<ParentExecution>,
    push_ref: Option<String>,
) -> RunExecutionData {
    let result_data = match error {
        Some(error) => ResultData {
            run_data: BTreeMap::new(),
            last_node_executed: Some(node.name.clone()),
            error: Some(error),
        },
        None => ResultData::default(),
    };

    RunExecutionData {
        start_node: Some(node.name.clone()),
        execution_stack: vec![StackEntry {
            node: node.name.clone(),
            data: workflow_data,
        }],
        result_data,
        parent_execution,
        push_ref,
    }
}

/// Wrap run data into a webhook-mode run request.
///
/// The request's push reference falls back to the run data's when unset.
pub fn build_run_request(
    workflow: &WorkflowSnapshot,
    execution_data: RunExecutionData,
    project_id: Option<String>,
    push_ref: Option<String>,
) -> RunRequest {
    let push_ref = push_ref.or_else(|| execution_data.push_ref.clone());
    RunRequest {
        mode: ExecutionMode::Webhook,
        execution_data,
        workflow: workflow.clone(),
        project_id,
        push_ref,
    }
}
