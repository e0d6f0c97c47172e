//! Completion signals for executions that are still running.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use hookrelay_types::execution::ExecutionId;

/// Running executions, each with a watch channel flipped to `true` on finish.
#[derive(Clone, Default)]
pub struct ActiveExecutions {
    running: Arc<DashMap<ExecutionId, watch::Sender<bool>>>,
}

impl ActiveExecutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly started execution.
    pub fn register(&self, id: &ExecutionId) {
        let (tx, _rx) = watch::channel(false);
        self.running.insert(id.clone(), tx);
    }

    /// Signal completion and stop tracking the execution.
    pub fn finish(&self, id: &ExecutionId) {
        if let Some((_, tx)) = self.running.remove(id) {
            tx.send_replace(true);
        }
    }

    pub fn is_running(&self, id: &ExecutionId) -> bool {
        self.running.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Resolves once the execution finishes. Unknown or already finished
    /// executions resolve immediately.
    pub fn completion(&self, id: &ExecutionId) -> impl Future<Output = ()> + Send + 'static {
        let rx = self.running.get(id).map(|tx| tx.subscribe());
        async move {
            if let Some(mut rx) = rx {
                // A dropped sender also ends the wait.
                let _ = rx.wait_for(|done| *done).await;
            }
        }
    }
}
