//! Execution runner that records each run and completes it in-process.
//!
//! Node graph evaluation happens elsewhere; this runner persists the run
//! request, marks it finished from the hook outcome, and signals waiters.

use tracing::{error, info};

use hookrelay_core::execution::{CompletionNotifier, ExecutionRunner};
use hookrelay_types::error::ExecutionError;
use hookrelay_types::execution::{ExecutionId, RunRequest};

use crate::sqlite::execution::{ExecutionStatus, SqliteExecutionStore};

use super::active::ActiveExecutions;

#[derive(Clone)]
pub struct LocalExecutionRunner {
    store: SqliteExecutionStore,
    active: ActiveExecutions,
}

impl LocalExecutionRunner {
    pub fn new(store: SqliteExecutionStore) -> Self {
        Self {
            store,
            active: ActiveExecutions::new(),
        }
    }

    pub fn active(&self) -> &ActiveExecutions {
        &self.active
    }
}

impl ExecutionRunner for LocalExecutionRunner {
    async fn submit(&self, run: RunRequest) -> Result<ExecutionId, ExecutionError> {
        let id = ExecutionId::generate();

        self.store
            .insert(&id, &run, ExecutionStatus::Running)
            .await
            .map_err(|e| ExecutionError::Submit(e.to_string()))?;
        self.active.register(&id);

        info!(
            execution_id = %id,
            workflow_id = %run.workflow.id,
            mode = %run.mode,
            "execution started"
        );

        let status = if run.execution_data.result_data.error.is_some() {
            ExecutionStatus::Error
        } else {
            ExecutionStatus::Success
        };

        let store = self.store.clone();
        let active = self.active.clone();
        let finished_id = id.clone();
        tokio::spawn(async move {
            if let Err(e) = store.set_status(&finished_id, status).await {
                error!(execution_id = %finished_id, error = %e, "failed to record execution status");
            }
            active.finish(&finished_id);
            info!(execution_id = %finished_id, %status, "execution finished");
        });

        Ok(id)
    }
}

impl CompletionNotifier for LocalExecutionRunner {
    fn on_complete(
        &self,
        execution_id: &ExecutionId,
    ) -> impl std::future::Future<Output = ()> + Send + 'static {
        self.active.completion(execution_id)
    }
}
