//! Resumes parent executions paused while waiting on a child run.

use tracing::info;

use hookrelay_core::execution::WaitTracker;
use hookrelay_types::error::ExecutionError;
use hookrelay_types::execution::ExecutionId;

use crate::sqlite::execution::{ExecutionStatus, SqliteExecutionStore};

pub struct SqliteWaitTracker {
    store: SqliteExecutionStore,
}

impl SqliteWaitTracker {
    pub fn new(store: SqliteExecutionStore) -> Self {
        Self { store }
    }
}

impl WaitTracker for SqliteWaitTracker {
    async fn resume(&self, execution_id: &ExecutionId) -> Result<(), ExecutionError> {
        let resumed = self
            .store
            .transition(execution_id, ExecutionStatus::Waiting, ExecutionStatus::Running)
            .await
            .map_err(|e| ExecutionError::Resume(e.to_string()))?;

        if !resumed {
            return Err(ExecutionError::NotFound(execution_id.to_string()));
        }

        info!(execution_id = %execution_id, "waiting execution resumed");
        Ok(())
    }
}
