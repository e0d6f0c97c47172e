//! Event dispatch: from an inbound event to started executions.

pub mod dispatcher;
pub mod report;

use std::sync::Arc;

use hookrelay_types::inbound::InboundEvent;
use hookrelay_types::workflow::WorkflowId;

use crate::auth::AuthStatus;

pub use dispatcher::EventDispatcher;
pub use report::{DispatchReceipt, DispatchResponse, TriggerOutcome, TriggerReport, WorkflowReport};

/// One inbound event as seen by one subscribed workflow.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Normalized registration path.
    pub path: String,
    pub workflow_id: WorkflowId,
    /// Project owning the workflow, if it has an owner share.
    pub project_id: Option<String>,
    pub auth: AuthStatus,
    pub event: Arc<InboundEvent>,
}
