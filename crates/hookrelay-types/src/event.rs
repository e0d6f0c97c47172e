//! Event registrations: the durable binding of a webhook path to the
//! workflows and trigger nodes subscribed to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflow::WorkflowId;

/// Cache key prefix for registration lookups.
pub const CACHE_KEY_PREFIX: &str = "event:";

/// A path registration and the trigger nodes bound to it, per workflow.
///
/// Record shape: `{ path: string (unique key), usages: map<workflowId, list<triggerNodeId>> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRegistration {
    /// Normalized path (see [`normalize_path`]).
    pub path: String,
    /// Workflow ID -> ordered trigger node names.
    #[serde(default)]
    pub usages: BTreeMap<WorkflowId, Vec<String>>,
}

impl EventRegistration {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            usages: BTreeMap::new(),
        }
    }

    /// Add a trigger node for a workflow. Returns `false` if it was already bound.
    pub fn add_usage(&mut self, workflow_id: WorkflowId, node: impl Into<String>) -> bool {
        let node = node.into();
        let triggers = self.usages.entry(workflow_id).or_default();
        if triggers.contains(&node) {
            return false;
        }
        triggers.push(node);
        true
    }

    /// Remove a single trigger node. Drops the workflow entry once it has no triggers left.
    pub fn remove_usage(&mut self, workflow_id: &WorkflowId, node: &str) -> bool {
        let Some(triggers) = self.usages.get_mut(workflow_id) else {
            return false;
        };
        let before = triggers.len();
        triggers.retain(|t| t != node);
        let removed = triggers.len() != before;
        if triggers.is_empty() {
            self.usages.remove(workflow_id);
        }
        removed
    }

    /// Remove every trigger of a workflow. Returns `true` if the workflow was present.
    pub fn remove_workflow(&mut self, workflow_id: &WorkflowId) -> bool {
        self.usages.remove(workflow_id).is_some()
    }

    /// A registration with no usages left should be deleted.
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }

    /// Cache key under which this registration's lookup is stored.
    pub fn cache_key(&self) -> String {
        cache_key(&self.path)
    }
}

/// Normalize a webhook path: no leading slash, at most one trailing slash stripped.
///
/// Case is not folded: `Slack/Team` and `slack/team` are distinct
/// registrations. Paths are compared byte-for-byte.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Join wildcard path segments and normalize the result.
pub fn normalize_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("/");
    normalize_path(&joined)
}

/// Cache key for a normalized path.
pub fn cache_key(path: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{path}")
}
