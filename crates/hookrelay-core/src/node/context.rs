//! The context a trigger node's hook runs with.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use hookrelay_types::execution::RunExecutionData;
use hookrelay_types::inbound::InboundEvent;
use hookrelay_types::workflow::{WorkflowNode, WorkflowSnapshot};

use crate::auth::AuthStatus;
use crate::dispatch::DispatchContext;

/// Per-trigger view of the event, the workflow and its static data.
///
/// The context owns the workflow unit's static data for the duration of the
/// hook; the unit takes it back with [`WebhookContext::into_static_data`].
#[derive(Debug)]
pub struct WebhookContext {
    workflow: Arc<WorkflowSnapshot>,
    node: WorkflowNode,
    dispatch: Arc<DispatchContext>,
    static_data: Value,
    execution_so_far: RunExecutionData,
}

impl WebhookContext {
    pub fn new(
        workflow: Arc<WorkflowSnapshot>,
        node: WorkflowNode,
        dispatch: Arc<DispatchContext>,
        static_data: Value,
    ) -> Self {
        Self {
            workflow,
            node,
            dispatch,
            static_data,
            execution_so_far: RunExecutionData::default(),
        }
    }

    pub fn workflow(&self) -> &WorkflowSnapshot {
        &self.workflow
    }

    pub fn node(&self) -> &WorkflowNode {
        &self.node
    }

    pub fn dispatch(&self) -> &DispatchContext {
        &self.dispatch
    }

    pub fn event(&self) -> &InboundEvent {
        &self.dispatch.event
    }

    pub fn body(&self) -> &Value {
        &self.dispatch.event.body
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        self.dispatch.event.headers()
    }

    pub fn node_parameter(&self, name: &str) -> Option<&Value> {
        self.node.parameter(name)
    }

    pub fn is_authenticated(&self) -> bool {
        self.dispatch.auth == AuthStatus::Authenticated
    }

    /// Always empty: hooks run before any node has executed.
    pub fn execution_so_far(&self) -> &RunExecutionData {
        &self.execution_so_far
    }

    pub fn static_data(&self) -> &Value {
        &self.static_data
    }

    /// The workflow-global static data object.
    pub fn static_data_mut(&mut self) -> &mut Value {
        if !self.static_data.is_object() {
            self.static_data = Value::Object(Map::new());
        }
        &mut self.static_data
    }

    /// Static data scoped to this node (`node:<name>`), created on first use.
    pub fn node_static_data_mut(&mut self) -> &mut Value {
        let key = format!("node:{}", self.node.name);
        let slot = &mut self.static_data_mut()[key.as_str()];
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        slot
    }

    pub fn into_static_data(self) -> Value {
        self.static_data
    }
}
