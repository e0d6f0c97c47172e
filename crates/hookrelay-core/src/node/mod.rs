//! Trigger node types.
//!
//! A trigger node type turns an inbound event into the items a workflow run
//! starts with. Node types are selected at runtime by the `type` of a
//! workflow node, so they are stored type-erased as [`BoxTriggerNode`].

pub mod box_node;
pub mod context;
pub mod event_trigger;
pub mod registry;

use hookrelay_types::error::NodeError;
use hookrelay_types::execution::WebhookResponseData;

pub use box_node::BoxTriggerNode;
pub use context::WebhookContext;
pub use event_trigger::EventTriggerNode;
pub use registry::NodeTypeRegistry;

/// Default name of the parameter listing subscribed event sub-types.
pub const DEFAULT_SUBSCRIPTION_PARAMETER: &str = "trigger";

/// A node type that can start a workflow from an inbound event.
pub trait TriggerNode: Send + Sync {
    /// Node type name as it appears in workflow definitions.
    fn type_name(&self) -> &str;

    /// Credential type used to authenticate events for this node, if any.
    fn credential_type(&self) -> Option<&str> {
        None
    }

    /// Parameter holding the subscribed event sub-types.
    fn subscription_parameter(&self) -> &str {
        DEFAULT_SUBSCRIPTION_PARAMETER
    }

    /// Whether the hook may answer the webhook caller synchronously.
    ///
    /// The dispatcher only holds the caller's response open for workflows
    /// with at least one such trigger.
    fn responds_synchronously(&self) -> bool {
        false
    }

    /// Handle one event for one node of a workflow.
    ///
    /// Returning data without `workflow_data` means nothing should run.
    fn webhook(
        &self,
        ctx: &mut WebhookContext,
    ) -> impl std::future::Future<Output = Result<WebhookResponseData, NodeError>> + Send;
}
