//! What the caller receives, and what each workflow unit did.

use serde_json::Value;
use tokio::task::JoinHandle;

use hookrelay_types::error::DispatchError;
use hookrelay_types::execution::ExecutionId;
use hookrelay_types::workflow::WorkflowId;

/// Response owed to the webhook caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResponse {
    /// Accepted; nothing to return.
    Acknowledged,
    /// Echo of a `url_verification` challenge.
    Challenge(Value),
    /// Data a trigger returned synchronously.
    Respond(Value),
}

/// Outcome for one trigger node of one workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Started {
        execution_id: ExecutionId,
        /// The hook failed; the execution records the failure.
        hook_failed: bool,
        resume_scheduled: bool,
    },
    /// The hook produced nothing to run.
    NoData,
    NotSubscribed,
    /// The registration names a node the workflow no longer has.
    StaleTriggerReference,
    Disabled,
    UnknownNodeType(String),
    AuthenticationRejected,
    SubmitFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerReport {
    pub node: String,
    pub outcome: TriggerOutcome,
}

/// Everything one workflow unit did for an event.
#[derive(Debug)]
pub struct WorkflowReport {
    pub workflow_id: WorkflowId,
    pub result: Result<Vec<TriggerReport>, DispatchError>,
    pub static_data_saved: bool,
}

impl WorkflowReport {
    /// Executions started by this unit.
    pub fn started(&self) -> Vec<&ExecutionId> {
        match &self.result {
            Ok(triggers) => triggers
                .iter()
                .filter_map(|t| match &t.outcome {
                    TriggerOutcome::Started { execution_id, .. } => Some(execution_id),
                    _ => None,
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Returned once dispatch is accepted.
///
/// `settled` resolves when every workflow unit has finished. Dropping it
/// does not cancel any work.
#[derive(Debug)]
pub struct DispatchReceipt {
    pub response: DispatchResponse,
    pub settled: Option<JoinHandle<Vec<WorkflowReport>>>,
}

impl DispatchReceipt {
    /// A receipt with no background work.
    pub fn immediate(response: DispatchResponse) -> Self {
        Self {
            response,
            settled: None,
        }
    }

    /// Wait for all workflow units. Empty for immediate receipts.
    pub async fn reports(self) -> Vec<WorkflowReport> {
        match self.settled {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        }
    }
}
