//! Decides whether a trigger node subscribes to an event's sub-type.

use serde_json::Value;
use tracing::warn;

use hookrelay_types::workflow::{WorkflowNode, WorkflowSnapshot};

use super::expression::SubscriptionEvaluator;

/// Matches event sub-types against a node's subscription parameter.
///
/// The parameter is a list of sub-type names. Any entry, or the whole
/// parameter, may be an `=` expression yielding a string or a list of
/// strings. Expressions that fail to evaluate contribute nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriggerMatcher;

impl TriggerMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the sub-types a node subscribes to.
    pub fn subscriptions(
        &self,
        node: &WorkflowNode,
        parameter: &str,
        workflow: &WorkflowSnapshot,
        static_data: &Value,
    ) -> Vec<String> {
        let Some(raw) = node.parameter(parameter) else {
            return Vec::new();
        };

        // Evaluator and context are only built when an expression is present.
        let mut evaluation: Option<(SubscriptionEvaluator, Value)> = None;
        let mut resolved = Vec::new();

        let entries: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        for entry in entries {
            let Some(text) = entry.as_str() else {
                continue;
            };
            if !SubscriptionEvaluator::is_expression(text) {
                resolved.push(text.to_string());
                continue;
            }

            let (evaluator, context) = evaluation.get_or_insert_with(|| {
                (
                    SubscriptionEvaluator::new(),
                    SubscriptionEvaluator::context_for(workflow, static_data),
                )
            });
            match evaluator.evaluate_subscriptions(text, context) {
                Ok(values) => resolved.extend(values),
                Err(e) => warn!(
                    workflow_id = %workflow.id,
                    node = %node.name,
                    parameter,
                    error = %e,
                    "subscription expression failed"
                ),
            }
        }

        resolved
    }

    /// Whether the node subscribes to `sub_type`. Events without a sub-type
    /// never match.
    pub fn matches(
        &self,
        node: &WorkflowNode,
        parameter: &str,
        workflow: &WorkflowSnapshot,
        static_data: &Value,
        sub_type: Option<&str>,
    ) -> bool {
        let Some(sub_type) = sub_type else {
            return false;
        };
        self.subscriptions(node, parameter, workflow, static_data)
            .iter()
            .any(|s| s == sub_type)
    }
}
