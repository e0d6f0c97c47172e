//! Built-in trigger for chat-platform event callbacks.

use tracing::debug;

use hookrelay_types::error::NodeError;
use hookrelay_types::execution::{NodeItem, WebhookResponseData};

use super::{TriggerNode, WebhookContext};

pub const EVENT_TRIGGER_TYPE: &str = "eventTrigger";
pub const EVENT_TRIGGER_CREDENTIAL_TYPE: &str = "slackApi";

/// Emits the callback's `event` object as the single output item.
#[derive(Debug, Default, Clone)]
pub struct EventTriggerNode;

impl EventTriggerNode {
    pub fn new() -> Self {
        Self
    }
}

impl TriggerNode for EventTriggerNode {
    fn type_name(&self) -> &str {
        EVENT_TRIGGER_TYPE
    }

    fn credential_type(&self) -> Option<&str> {
        Some(EVENT_TRIGGER_CREDENTIAL_TYPE)
    }

    async fn webhook(&self, ctx: &mut WebhookContext) -> Result<WebhookResponseData, NodeError> {
        let Some(event) = ctx.body().get("event").filter(|e| e.is_object()) else {
            debug!(node = %ctx.node().name, "callback body has no event object");
            return Ok(WebhookResponseData::skip());
        };

        Ok(WebhookResponseData::run_with(vec![NodeItem::new(event.clone())]))
    }
}
