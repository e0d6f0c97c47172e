//! BoxTriggerNode -- object-safe dynamic dispatch wrapper for TriggerNode.
//!
//! 1. Define an object-safe `TriggerNodeDyn` trait with boxed futures
//! 2. Blanket-impl `TriggerNodeDyn` for all `T: TriggerNode`
//! 3. `BoxTriggerNode` wraps `Box<dyn TriggerNodeDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use hookrelay_types::error::NodeError;
use hookrelay_types::execution::WebhookResponseData;

use super::TriggerNode;
use super::context::WebhookContext;

/// Object-safe version of [`TriggerNode`] with boxed futures.
pub trait TriggerNodeDyn: Send + Sync {
    fn type_name(&self) -> &str;

    fn credential_type(&self) -> Option<&str>;

    fn subscription_parameter(&self) -> &str;

    fn responds_synchronously(&self) -> bool;

    fn webhook_boxed<'a>(
        &'a self,
        ctx: &'a mut WebhookContext,
    ) -> Pin<Box<dyn Future<Output = Result<WebhookResponseData, NodeError>> + Send + 'a>>;
}

impl<T: TriggerNode> TriggerNodeDyn for T {
    fn type_name(&self) -> &str {
        TriggerNode::type_name(self)
    }

    fn credential_type(&self) -> Option<&str> {
        TriggerNode::credential_type(self)
    }

    fn subscription_parameter(&self) -> &str {
        TriggerNode::subscription_parameter(self)
    }

    fn responds_synchronously(&self) -> bool {
        TriggerNode::responds_synchronously(self)
    }

    fn webhook_boxed<'a>(
        &'a self,
        ctx: &'a mut WebhookContext,
    ) -> Pin<Box<dyn Future<Output = Result<WebhookResponseData, NodeError>> + Send + 'a>> {
        Box::pin(self.webhook(ctx))
    }
}

/// Type-erased trigger node for runtime node type selection.
pub struct BoxTriggerNode {
    inner: Box<dyn TriggerNodeDyn + Send + Sync>,
}

impl BoxTriggerNode {
    pub fn new<T: TriggerNode + 'static>(node: T) -> Self {
        Self {
            inner: Box::new(node),
        }
    }

    pub fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    pub fn credential_type(&self) -> Option<&str> {
        self.inner.credential_type()
    }

    pub fn subscription_parameter(&self) -> &str {
        self.inner.subscription_parameter()
    }

    pub fn responds_synchronously(&self) -> bool {
        self.inner.responds_synchronously()
    }

    pub async fn webhook(&self, ctx: &mut WebhookContext) -> Result<WebhookResponseData, NodeError> {
        self.inner.webhook_boxed(ctx).await
    }
}

impl std::fmt::Debug for BoxTriggerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxTriggerNode")
            .field("type_name", &self.type_name())
            .finish()
    }
}
