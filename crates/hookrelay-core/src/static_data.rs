//! Write-back of workflow static data after a dispatch unit finishes.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use hookrelay_types::workflow::WorkflowId;

use crate::repository::workflow::WorkflowStore;

/// Persists a workflow unit's static data when its triggers changed it.
pub struct StaticDataPersister<W> {
    store: Arc<W>,
}

impl<W: WorkflowStore> StaticDataPersister<W> {
    pub fn new(store: Arc<W>) -> Self {
        Self { store }
    }

    /// Save `current` if it differs from `original`. Returns whether it was
    /// saved; store errors are logged, never propagated.
    pub async fn persist(&self, workflow_id: &WorkflowId, original: &Value, current: &Value) -> bool {
        if original == current {
            return false;
        }

        match self.store.save_static_data(workflow_id, current).await {
            Ok(()) => {
                debug!(workflow_id = %workflow_id, "static data saved");
                true
            }
            Err(e) => {
                warn!(workflow_id = %workflow_id, error = %e, "failed to save static data");
                false
            }
        }
    }
}
