//! Run requests handed to the execution runner, and the data a trigger
//! node's hook produces.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::workflow::WorkflowSnapshot;

/// Identifier assigned by the execution runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    /// A fresh time-sortable identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an execution was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Webhook,
    Trigger,
    Manual,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Webhook => write!(f, "webhook"),
            ExecutionMode::Trigger => write!(f, "trigger"),
            ExecutionMode::Manual => write!(f, "manual"),
        }
    }
}

/// One output item of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeItem {
    pub json: Value,
}

impl NodeItem {
    pub fn new(json: Value) -> Self {
        Self { json }
    }

    /// An item carrying an empty JSON object.
    pub fn empty() -> Self {
        Self {
            json: Value::Object(Default::default()),
        }
    }
}

/// A paused execution waiting for a child to finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentExecution {
    pub execution_id: ExecutionId,
    /// `Some(false)` opts out of resumption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_resume: Option<bool>,
}

impl ParentExecution {
    /// Resume unless the flag is explicitly false.
    pub fn wants_resume(&self) -> bool {
        self.should_resume != Some(false)
    }
}

/// Relates a newly started execution to the parent awaiting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionLink {
    pub child: ExecutionId,
    pub parent: ParentExecution,
}

impl ExecutionLink {
    /// Build a link only when the parent wants to be resumed.
    pub fn resumable(child: ExecutionId, parent: Option<&ParentExecution>) -> Option<Self> {
        parent.filter(|p| p.wants_resume()).map(|p| Self {
            child,
            parent: p.clone(),
        })
    }
}

/// Error attached to run data when a trigger hook failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub node_name: String,
    pub node_type: String,
}

/// Result section of run data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultData {
    #[serde(default)]
    pub run_data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_node_executed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionErrorInfo>,
}

/// A node queued for execution with its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    pub node: String,
    pub data: Vec<Vec<NodeItem>>,
}

/// Execution-ready state for a new run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunExecutionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node: Option<String>,
    #[serde(default)]
    pub execution_stack: Vec<StackEntry>,
    #[serde(default)]
    pub result_data: ResultData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_execution: Option<ParentExecution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_ref: Option<String>,
}

/// A request to start a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub mode: ExecutionMode,
    pub execution_data: RunExecutionData,
    pub workflow: WorkflowSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Push/streaming channel of a waiting editor session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_ref: Option<String>,
}

/// What a trigger node's hook produced for one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponseData {
    /// Items to start a run with; `None` means nothing should run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_data: Option<Vec<Vec<NodeItem>>>,
    /// Data returned synchronously to the webhook caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_response: Option<Value>,
    #[serde(default)]
    pub no_webhook_response: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_execution: Option<ParentExecution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_ref: Option<String>,
}

impl WebhookResponseData {
    /// Start a run with a single output branch.
    pub fn run_with(items: Vec<NodeItem>) -> Self {
        Self {
            workflow_data: Some(vec![items]),
            ..Default::default()
        }
    }

    /// Nothing to run.
    pub fn skip() -> Self {
        Self::default()
    }
}
