//! Workflow records as stored, and the per-dispatch snapshot built from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// Share role that marks the owning project of a workflow.
pub const OWNER_ROLE: &str = "workflow:owner";

/// Identifier of a workflow in the workflow store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference from a node to a stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRef {
    pub id: Option<String>,
    pub name: String,
}

/// A node inside a workflow version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Unique within the workflow; registrations reference nodes by name.
    pub name: String,
    /// Node type name, resolved through the node type registry.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_type_version")]
    pub type_version: f64,
    #[serde(default)]
    pub parameters: Value,
    /// Credential type -> stored credential.
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialRef>,
    #[serde(default)]
    pub disabled: bool,
}

fn default_type_version() -> f64 {
    1.0
}

impl WorkflowNode {
    /// Look up a top-level node parameter.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

/// The published version of a workflow's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowVersion {
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub connections: Value,
}

/// Project access granted on a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowShare {
    pub project_id: String,
    pub role: String,
}

/// A workflow as returned by the workflow store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: WorkflowId,
    pub name: String,
    /// `None` when the workflow is not activated.
    pub active_version: Option<WorkflowVersion>,
    #[serde(default)]
    pub static_data: Value,
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub shares: Vec<WorkflowShare>,
}

impl WorkflowRecord {
    /// The project holding the owner share, if any.
    pub fn owner_project_id(&self) -> Option<&str> {
        self.shares
            .iter()
            .find(|share| share.role == OWNER_ROLE)
            .map(|share| share.project_id.as_str())
    }

    /// Build an immutable snapshot of the active version.
    pub fn snapshot(&self) -> Result<WorkflowSnapshot, DispatchError> {
        let version = self
            .active_version
            .as_ref()
            .ok_or_else(|| DispatchError::NoActiveVersion(self.id.clone()))?;

        Ok(WorkflowSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            nodes: version.nodes.clone(),
            connections: version.connections.clone(),
            static_data: self.static_data.clone(),
            settings: self.settings.clone(),
            active: true,
        })
    }
}

/// The active workflow definition loaded for one dispatch.
///
/// Each dispatch unit owns its own snapshot; it is never shared across
/// concurrent dispatches, even for the same workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub id: WorkflowId,
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub connections: Value,
    /// Static data as loaded. The dispatch unit mutates its own copy and
    /// persists it explicitly.
    pub static_data: Value,
    pub settings: Value,
    pub active: bool,
}

impl WorkflowSnapshot {
    /// Find a node by name.
    pub fn node(&self, name: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}
