//! Decrypted credential fields and the request used to resolve them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflow::WorkflowId;

/// Decrypted credential fields (e.g. `signatureSecret`).
///
/// `Debug` prints field names only, never values.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialData(pub Map<String, Value>);

impl CredentialData {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// A non-empty string field.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for CredentialData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialData")
            .field("fields", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Which credential to resolve for a trigger node of a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub workflow_id: WorkflowId,
    pub project_id: Option<String>,
    pub credential_type: String,
    pub node_name: String,
    /// Explicit credential selected on the node, when set.
    pub credential_id: Option<String>,
}
