//! Node type registry: type name -> trigger node implementation.

use std::collections::HashMap;

use super::{BoxTriggerNode, EventTriggerNode, TriggerNode};

#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    nodes: HashMap<String, BoxTriggerNode>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in trigger node types.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(EventTriggerNode::new());
        registry
    }

    /// Register a node type under its type name, replacing any previous one.
    pub fn register<T: TriggerNode + 'static>(&mut self, node: T) {
        let boxed = BoxTriggerNode::new(node);
        self.nodes.insert(boxed.type_name().to_string(), boxed);
    }

    pub fn get(&self, type_name: &str) -> Option<&BoxTriggerNode> {
        self.nodes.get(type_name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
